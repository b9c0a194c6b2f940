//! The compiled stylesheet.
//!
//! Everything here is built bottom-up by the compiler and never changes
//! afterwards; fields are only reachable through accessors. Names and values
//! are [`Segment`]s pointing into the stylesheet source.

use std::fmt;

use ribbon_core::Segment;
use serde::Serialize;
use smallvec::SmallVec;

/// Name of the rule a transition compiles to.
pub const TRANSITION: &str = "transition";

#[derive(Clone, Debug, PartialEq, Default, Serialize)]
pub struct Document {
    pub(crate) rule_sets: Vec<RuleSet>,
    pub(crate) storyboards: Vec<Storyboard>,
}

impl Document {
    pub fn rule_sets(&self) -> &[RuleSet] {
        &self.rule_sets
    }

    pub fn storyboards(&self) -> &[Storyboard] {
        &self.storyboards
    }

    /// The first storyboard named `name`.
    pub fn storyboard(&self, name: &str) -> Option<&Storyboard> {
        self.storyboards.iter().find(|s| s.name == name)
    }

    pub fn is_empty(&self) -> bool {
        self.rule_sets.is_empty() && self.storyboards.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RuleSet {
    pub(crate) selectors: Vec<Selector>,
    pub(crate) rules: Vec<Rule>,
    pub(crate) triggers: Vec<Trigger>,
}

impl RuleSet {
    /// The rule set applies wherever any one of these matches.
    pub fn selectors(&self) -> &[Selector] {
        &self.selectors
    }

    /// Rules and transitions in source order.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn triggers(&self) -> &[Trigger] {
        &self.triggers
    }

    pub fn transitions(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter().filter(|rule| rule.is_transition())
    }

    pub fn property_triggers(&self) -> impl Iterator<Item = &PropertyTrigger> {
        self.triggers.iter().filter_map(|trigger| match trigger {
            Trigger::Property(trigger) => Some(trigger),
            Trigger::Event(_) => None,
        })
    }

    pub fn event_triggers(&self) -> impl Iterator<Item = &EventTrigger> {
        self.triggers.iter().filter_map(|trigger| match trigger {
            Trigger::Event(trigger) => Some(trigger),
            Trigger::Property(_) => None,
        })
    }
}

/// How a selector part relates to the part before it.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Qualifier {
    /// Any descendant; written as whitespace.
    #[default]
    Descendant,
    /// `>`
    VisualChild,
    /// `>>`
    TemplatedChild,
    /// `/`
    LogicalChild,
}

impl Qualifier {
    pub fn from_token(text: &str) -> Option<Qualifier> {
        match text {
            ">" => Some(Qualifier::VisualChild),
            ">>" => Some(Qualifier::TemplatedChild),
            "/" => Some(Qualifier::LogicalChild),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Selector {
    pub(crate) parts: Vec<SelectorPart>,
}

impl Selector {
    pub fn parts(&self) -> &[SelectorPart] {
        &self.parts
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, part) in self.parts.iter().enumerate() {
            if i > 0 {
                match part.qualifier {
                    Qualifier::Descendant => f.write_str(" ")?,
                    Qualifier::VisualChild => f.write_str(" > ")?,
                    Qualifier::TemplatedChild => f.write_str(" >> ")?,
                    Qualifier::LogicalChild => f.write_str(" / ")?,
                }
            }
            write!(f, "{part}")?;
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SelectorPart {
    pub(crate) qualifier: Qualifier,
    pub(crate) element: Option<Segment>,
    pub(crate) exact: bool,
    pub(crate) id: Option<Segment>,
    pub(crate) pseudo_class: Option<Segment>,
    pub(crate) classes: SmallVec<[Segment; 2]>,
}

impl SelectorPart {
    pub fn qualifier(&self) -> Qualifier {
        self.qualifier
    }

    /// Element type name; `None` matches any type.
    pub fn element(&self) -> Option<&str> {
        self.element.as_deref()
    }

    /// Match the element type exactly, excluding subtypes.
    pub fn is_exact(&self) -> bool {
        self.exact
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn pseudo_class(&self) -> Option<&str> {
        self.pseudo_class.as_deref()
    }

    pub fn classes(&self) -> &[Segment] {
        &self.classes
    }
}

impl fmt::Display for SelectorPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.exact {
            f.write_str("^")?;
        }
        match &self.element {
            Some(element) => f.write_str(element)?,
            None if self.id.is_none() && self.classes.is_empty() => f.write_str("*")?,
            None => {}
        }
        if let Some(id) = &self.id {
            write!(f, "#{id}")?;
        }
        for class in &self.classes {
            write!(f, ".{class}")?;
        }
        if let Some(pseudo) = &self.pseudo_class {
            write!(f, ":{pseudo}")?;
        }
        Ok(())
    }
}

/// A property, optionally qualified by the type that owns it as an attached
/// property.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct PropertyName {
    pub(crate) owner: Option<Segment>,
    pub(crate) name: Segment,
}

impl PropertyName {
    pub fn new(owner: Option<Segment>, name: Segment) -> Self {
        Self { owner, name }
    }

    pub fn owner(&self) -> Option<&str> {
        self.owner.as_deref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_attached(&self) -> bool {
        self.owner.is_some()
    }
}

impl fmt::Display for PropertyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.owner {
            Some(owner) => write!(f, "{owner}.{}", self.name),
            None => f.write_str(&self.name),
        }
    }
}

/// A property assignment, or a transition when named [`TRANSITION`].
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Rule {
    pub(crate) property: PropertyName,
    pub(crate) value: Segment,
    pub(crate) important: bool,
    pub(crate) arguments: Vec<Segment>,
}

impl Rule {
    pub fn property(&self) -> &PropertyName {
        &self.property
    }

    pub fn name(&self) -> &str {
        self.property.name()
    }

    /// The raw value token, empty for transitions.
    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn is_important(&self) -> bool {
        self.important
    }

    pub fn arguments(&self) -> &[Segment] {
        &self.arguments
    }

    pub fn is_transition(&self) -> bool {
        !self.property.is_attached() && self.property.name() == TRANSITION
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Trigger {
    Property(PropertyTrigger),
    Event(EventTrigger),
}

impl Trigger {
    pub fn actions(&self) -> &[TriggerAction] {
        match self {
            Trigger::Property(trigger) => &trigger.actions,
            Trigger::Event(trigger) => &trigger.actions,
        }
    }

    pub fn is_important(&self) -> bool {
        match self {
            Trigger::Property(trigger) => trigger.important,
            Trigger::Event(trigger) => trigger.important,
        }
    }
}

/// Fires while every condition holds.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PropertyTrigger {
    pub(crate) important: bool,
    pub(crate) conditions: SmallVec<[Condition; 2]>,
    pub(crate) actions: Vec<TriggerAction>,
}

impl PropertyTrigger {
    pub fn is_important(&self) -> bool {
        self.important
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn actions(&self) -> &[TriggerAction] {
        &self.actions
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Condition {
    pub(crate) property: PropertyName,
    pub(crate) comparison: Comparison,
    pub(crate) value: Segment,
}

impl Condition {
    pub fn property(&self) -> &PropertyName {
        &self.property
    }

    pub fn comparison(&self) -> Comparison {
        self.comparison
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Comparison {
    Equals,
    NotEquals,
    GreaterThan,
    LessThan,
    GreaterOrEqual,
    LessOrEqual,
}

impl Comparison {
    pub fn from_token(text: &str) -> Option<Comparison> {
        Some(match text {
            "==" => Comparison::Equals,
            "!=" => Comparison::NotEquals,
            ">" => Comparison::GreaterThan,
            "<" => Comparison::LessThan,
            ">=" => Comparison::GreaterOrEqual,
            "<=" => Comparison::LessOrEqual,
            _ => return None,
        })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Comparison::Equals => "==",
            Comparison::NotEquals => "!=",
            Comparison::GreaterThan => ">",
            Comparison::LessThan => "<",
            Comparison::GreaterOrEqual => ">=",
            Comparison::LessOrEqual => "<=",
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fires when a routed event is raised.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EventTrigger {
    pub(crate) event: Segment,
    /// Also fire for events already marked handled.
    pub(crate) handled: bool,
    /// Mark the event handled after running the actions.
    pub(crate) set_handled: bool,
    pub(crate) important: bool,
    pub(crate) actions: Vec<TriggerAction>,
}

impl EventTrigger {
    pub fn event(&self) -> &str {
        &self.event
    }

    pub fn handled(&self) -> bool {
        self.handled
    }

    pub fn set_handled(&self) -> bool {
        self.set_handled
    }

    pub fn is_important(&self) -> bool {
        self.important
    }

    pub fn actions(&self) -> &[TriggerAction] {
        &self.actions
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum TriggerAction {
    PlayStoryboard {
        storyboard: Segment,
        selector: Option<Selector>,
    },
    PlaySound {
        asset: Segment,
    },
    Set {
        property: PropertyName,
        selector: Option<Selector>,
        value: Segment,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum LoopBehavior {
    #[default]
    None,
    Loop,
    Reverse,
}

impl LoopBehavior {
    pub fn from_keyword(text: &str) -> Option<LoopBehavior> {
        match text {
            "none" => Some(LoopBehavior::None),
            "loop" => Some(LoopBehavior::Loop),
            "reverse" => Some(LoopBehavior::Reverse),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Storyboard {
    pub(crate) name: Segment,
    pub(crate) loop_behavior: LoopBehavior,
    pub(crate) targets: Vec<StoryboardTarget>,
}

impl Storyboard {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn loop_behavior(&self) -> LoopBehavior {
        self.loop_behavior
    }

    pub fn targets(&self) -> &[StoryboardTarget] {
        &self.targets
    }

    /// Time of the last keyframe across all targets, 0 when there are none.
    pub fn duration(&self) -> f32 {
        self.targets
            .iter()
            .flat_map(|target| &target.animations)
            .flat_map(|animation| &animation.keyframes)
            .map(|keyframe| keyframe.time)
            .fold(0.0, f32::max)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StoryboardTarget {
    pub(crate) selector: Option<Selector>,
    pub(crate) filter: SmallVec<[Segment; 1]>,
    pub(crate) animations: Vec<Animation>,
}

impl StoryboardTarget {
    /// Narrows the animated elements; `None` targets the element the
    /// storyboard runs on.
    pub fn selector(&self) -> Option<&Selector> {
        self.selector.as_ref()
    }

    /// Element type names the animations apply to.
    pub fn filter(&self) -> &[Segment] {
        &self.filter
    }

    pub fn animations(&self) -> &[Animation] {
        &self.animations
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Animation {
    pub(crate) property: PropertyName,
    pub(crate) navigation: Option<Navigation>,
    pub(crate) keyframes: Vec<Keyframe>,
}

impl Animation {
    pub fn property(&self) -> &PropertyName {
        &self.property
    }

    /// The animated property as written, `Owner.name` for attached
    /// properties.
    pub fn property_path(&self) -> String {
        self.property.to_string()
    }

    pub fn navigation(&self) -> Option<&Navigation> {
        self.navigation.as_ref()
    }

    pub fn keyframes(&self) -> &[Keyframe] {
        &self.keyframes
    }
}

/// Redirects an animation to an element reached through a property.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Navigation {
    pub(crate) property: Segment,
    pub(crate) target_type: Segment,
}

impl Navigation {
    pub fn property(&self) -> &str {
        &self.property
    }

    pub fn target_type(&self) -> &str {
        &self.target_type
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Keyframe {
    pub(crate) time: f32,
    pub(crate) value: Segment,
    pub(crate) easing: Option<Segment>,
}

impl Keyframe {
    /// Offset from the start of the storyboard, in seconds.
    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn easing(&self) -> Option<&str> {
        self.easing.as_deref()
    }
}
