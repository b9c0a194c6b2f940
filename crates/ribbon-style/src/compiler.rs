//! Lowers a syntax tree into a [`Document`].
//!
//! Compilation is all-or-nothing: the tree's diagnostics are checked before
//! any model is built, and the first shape error aborts the whole document.
//! Each entity's children are compiled before the entity itself is
//! constructed, so nothing is mutated after it is built.

use log::debug;
use ribbon_core::{Segment, Severity};
use smallvec::SmallVec;

use crate::error::{CompileError, InternalError, StyleError};
use crate::model::{
    Comparison, Condition, Document, EventTrigger, PropertyName, PropertyTrigger, Qualifier,
    Rule, RuleSet, Selector, SelectorPart, TRANSITION, Trigger, TriggerAction,
};
use crate::options::CompilerOptions;
use crate::syntax::{SyntaxElement, SyntaxKind, SyntaxNode, SyntaxToken, SyntaxTree, TokenKind};

/// Event trigger argument that also fires for already-handled events.
const HANDLED: &str = "handled";
/// Event trigger argument that marks the event handled.
const SET_HANDLED: &str = "set-handled";

/// Compile `tree` with default options.
pub fn compile(tree: &SyntaxTree) -> Result<Document, StyleError> {
    Compiler::new().compile(tree)
}

#[derive(Clone, Debug, Default)]
pub struct Compiler {
    pub(crate) options: CompilerOptions,
}

impl Compiler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: CompilerOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }

    pub fn compile(&self, tree: &SyntaxTree) -> Result<Document, StyleError> {
        self.check_diagnostics(tree)?;

        let root = tree.root();
        let mut rule_sets = Vec::new();
        let mut storyboards = Vec::new();
        for node in root.nodes() {
            match node.kind {
                SyntaxKind::RuleSet => rule_sets.push(self.rule_set(node)?),
                SyntaxKind::Storyboard => storyboards.push(self.storyboard(node)?),
                found => return Err(unexpected(root, found).into()),
            }
        }

        debug!(
            "compiled stylesheet: {} rule sets, {} storyboards",
            rule_sets.len(),
            storyboards.len()
        );
        Ok(Document {
            rule_sets,
            storyboards,
        })
    }

    fn check_diagnostics(&self, tree: &SyntaxTree) -> Result<(), CompileError> {
        let failed: Vec<_> = tree
            .diagnostics()
            .into_iter()
            .filter(|d| match d.severity() {
                Severity::Error => true,
                Severity::Warning => self.options.warnings_as_errors,
                Severity::Note => false,
            })
            .cloned()
            .collect();
        if failed.is_empty() {
            return Ok(());
        }
        debug!("refusing to compile: {} diagnostics", failed.len());
        Err(CompileError::new(failed))
    }

    fn rule_set(&self, node: &SyntaxNode) -> Result<RuleSet, StyleError> {
        let mut selectors = Vec::new();
        let mut rules = Vec::new();
        let mut triggers = Vec::new();

        for child in node.nodes() {
            match child.kind {
                SyntaxKind::Selector => selectors.push(self.selector(child)?),
                SyntaxKind::Rule => rules.push(rule(child)?),
                SyntaxKind::Transition => rules.push(transition(child)),
                SyntaxKind::PropertyTrigger => {
                    triggers.push(Trigger::Property(self.property_trigger(child)?))
                }
                SyntaxKind::EventTrigger => {
                    triggers.push(Trigger::Event(self.event_trigger(child)?))
                }
                found => return Err(unexpected(node, found).into()),
            }
        }

        debug!(
            "rule set: {} selectors, {} rules, {} triggers",
            selectors.len(),
            rules.len(),
            triggers.len()
        );
        Ok(RuleSet {
            selectors,
            rules,
            triggers,
        })
    }

    /// Parts in order; a `ChildQualifier` token applies to the part after it.
    pub(crate) fn selector(&self, node: &SyntaxNode) -> Result<Selector, InternalError> {
        let mut parts = Vec::new();
        let mut qualifier = Qualifier::Descendant;

        for child in &node.children {
            match child {
                SyntaxElement::Token(token) if token.kind == TokenKind::ChildQualifier => {
                    qualifier = Qualifier::from_token(&token.text)
                        .ok_or_else(|| InternalError::UnknownQualifier(token.text.to_string()))?;
                }
                SyntaxElement::Token(_) => {}
                SyntaxElement::Node(part) if part.kind == SyntaxKind::SelectorPart => {
                    parts.push(selector_part(part, qualifier));
                    qualifier = Qualifier::Descendant;
                }
                SyntaxElement::Node(other) => {
                    return Err(unexpected(node, other.kind));
                }
            }
        }

        Ok(Selector { parts })
    }

    fn property_trigger(&self, node: &SyntaxNode) -> Result<PropertyTrigger, InternalError> {
        let mut conditions = SmallVec::new();
        let mut actions = Vec::new();

        for child in node.nodes() {
            match child.kind {
                SyntaxKind::Condition => conditions.push(condition(child)?),
                kind if kind.is_action() => actions.push(self.action(node, child)?),
                found => return Err(unexpected(node, found)),
            }
        }

        Ok(PropertyTrigger {
            important: node.has_token(TokenKind::Important),
            conditions,
            actions,
        })
    }

    fn event_trigger(&self, node: &SyntaxNode) -> Result<EventTrigger, InternalError> {
        let event = required_token(node, TokenKind::Identifier)?.text.clone();
        let has_argument = |name: &str| node.tokens_of(TokenKind::Argument).any(|t| t.text == name);

        let mut actions = Vec::new();
        for child in node.nodes() {
            if !child.kind.is_action() {
                return Err(unexpected(node, child.kind));
            }
            actions.push(self.action(node, child)?);
        }

        Ok(EventTrigger {
            event,
            handled: has_argument(HANDLED),
            set_handled: has_argument(SET_HANDLED),
            important: node.has_token(TokenKind::Important),
            actions,
        })
    }

    fn action(
        &self,
        trigger: &SyntaxNode,
        node: &SyntaxNode,
    ) -> Result<TriggerAction, InternalError> {
        let selector = node
            .node(SyntaxKind::Selector)
            .map(|selector| self.selector(selector))
            .transpose()?;

        match node.kind {
            SyntaxKind::PlayStoryboardAction => Ok(TriggerAction::PlayStoryboard {
                storyboard: required_token(node, TokenKind::Identifier)?.text.clone(),
                selector,
            }),
            SyntaxKind::PlaySoundAction => Ok(TriggerAction::PlaySound {
                asset: required_token(node, TokenKind::Value)?.text.clone(),
            }),
            SyntaxKind::SetAction => Ok(TriggerAction::Set {
                property: property_name(required_node(node, SyntaxKind::PropertyName)?)?,
                selector,
                value: required_token(node, TokenKind::Value)?.text.clone(),
            }),
            found => Err(unexpected(trigger, found)),
        }
    }
}

fn selector_part(node: &SyntaxNode, qualifier: Qualifier) -> SelectorPart {
    let text = |kind| node.token(kind).map(|token| token.text.clone());
    SelectorPart {
        qualifier,
        // `*` leaves the element unset
        element: text(TokenKind::TypeName),
        exact: node.has_token(TokenKind::Exact),
        id: text(TokenKind::Id),
        pseudo_class: text(TokenKind::PseudoClass),
        classes: node
            .tokens_of(TokenKind::Class)
            .map(|token| token.text.clone())
            .collect(),
    }
}

fn rule(node: &SyntaxNode) -> Result<Rule, InternalError> {
    Ok(Rule {
        property: property_name(required_node(node, SyntaxKind::PropertyName)?)?,
        value: required_token(node, TokenKind::Value)?.text.clone(),
        important: node.has_token(TokenKind::Important),
        arguments: Vec::new(),
    })
}

fn transition(node: &SyntaxNode) -> Rule {
    Rule {
        property: PropertyName::new(None, Segment::from(TRANSITION)),
        value: Segment::default(),
        important: node.has_token(TokenKind::Important),
        arguments: node
            .tokens_of(TokenKind::Argument)
            .map(|token| token.text.clone())
            .collect(),
    }
}

fn condition(node: &SyntaxNode) -> Result<Condition, InternalError> {
    let operator = required_token(node, TokenKind::Operator)?;
    let comparison = Comparison::from_token(&operator.text)
        .ok_or_else(|| InternalError::UnknownOperator(operator.text.to_string()))?;
    Ok(Condition {
        property: property_name(required_node(node, SyntaxKind::PropertyName)?)?,
        comparison,
        value: required_token(node, TokenKind::Value)?.text.clone(),
    })
}

pub(crate) fn property_name(node: &SyntaxNode) -> Result<PropertyName, InternalError> {
    Ok(PropertyName::new(
        node.token(TokenKind::TypeName).map(|owner| owner.text.clone()),
        required_token(node, TokenKind::Identifier)?.text.clone(),
    ))
}

pub(crate) fn required_token(
    node: &SyntaxNode,
    token: TokenKind,
) -> Result<&SyntaxToken, InternalError> {
    node.token(token).ok_or(InternalError::MissingToken {
        node: node.kind,
        token,
    })
}

pub(crate) fn required_node(
    node: &SyntaxNode,
    child: SyntaxKind,
) -> Result<&SyntaxNode, InternalError> {
    node.node(child).ok_or(InternalError::MissingNode {
        node: node.kind,
        child,
    })
}

pub(crate) fn unexpected(parent: &SyntaxNode, found: SyntaxKind) -> InternalError {
    InternalError::UnexpectedNode {
        parent: parent.kind,
        found,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::TreeBuilder;
    use ribbon_core::{Diagnostic, DiagnosticCode, Span};

    fn property(b: &mut TreeBuilder, owner: Option<&str>, name: &str) {
        b.node(SyntaxKind::PropertyName, |b| {
            if let Some(owner) = owner {
                b.token(TokenKind::TypeName, owner);
            }
            b.token(TokenKind::Identifier, name);
        });
    }

    fn part(b: &mut TreeBuilder, element: &str) {
        b.node(SyntaxKind::SelectorPart, |b| {
            b.token(TokenKind::TypeName, element);
        });
    }

    fn rule_set(build: impl FnOnce(&mut TreeBuilder)) -> SyntaxTree {
        let mut builder = TreeBuilder::new();
        builder.node(SyntaxKind::RuleSet, build);
        builder.finish()
    }

    fn only_rule_set(tree: &SyntaxTree) -> RuleSet {
        let document = compile(tree).unwrap();
        assert_eq!(document.rule_sets().len(), 1);
        document.rule_sets()[0].clone()
    }

    #[test]
    fn empty_tree_compiles_to_empty_document() {
        let tree = TreeBuilder::new().finish();
        assert!(compile(&tree).unwrap().is_empty());
    }

    #[test]
    fn qualifiers_apply_to_following_part() {
        let tree = rule_set(|b| {
            b.node(SyntaxKind::Selector, |b| {
                part(b, "Window");
                b.token(TokenKind::ChildQualifier, ">>");
                part(b, "Border");
                part(b, "Grid");
                b.token(TokenKind::ChildQualifier, "/");
                b.node(SyntaxKind::SelectorPart, |b| {
                    b.token(TokenKind::Exact, "^");
                    b.token(TokenKind::Star, "*");
                    b.token(TokenKind::Id, "content");
                    b.token(TokenKind::PseudoClass, "focused");
                });
            });
        });

        let rule_set = only_rule_set(&tree);
        let parts = rule_set.selectors()[0].parts();
        let qualifiers: Vec<_> = parts.iter().map(|p| p.qualifier()).collect();
        assert_eq!(
            qualifiers,
            [
                Qualifier::Descendant,
                Qualifier::TemplatedChild,
                Qualifier::Descendant,
                Qualifier::LogicalChild
            ]
        );
        let last = &parts[3];
        assert_eq!(last.element(), None);
        assert!(last.is_exact());
        assert_eq!(last.id(), Some("content"));
        assert_eq!(last.pseudo_class(), Some("focused"));
        assert_eq!(
            rule_set.selectors()[0].to_string(),
            "Window >> Border Grid / ^#content:focused"
        );
    }

    #[test]
    fn multiple_selectors_and_attached_rule() {
        let tree = rule_set(|b| {
            b.node(SyntaxKind::Selector, |b| part(b, "Button"));
            b.node(SyntaxKind::Selector, |b| part(b, "ToggleButton"));
            b.node(SyntaxKind::Rule, |b| {
                property(b, Some("Grid"), "column");
                b.token(TokenKind::Value, "2");
            });
        });

        let rule_set = only_rule_set(&tree);
        assert_eq!(rule_set.selectors().len(), 2);
        let rule = &rule_set.rules()[0];
        assert_eq!(rule.property().owner(), Some("Grid"));
        assert_eq!(rule.name(), "column");
        assert_eq!(rule.value(), "2");
        assert!(!rule.is_important());
        assert!(rule.arguments().is_empty());
    }

    #[test]
    fn transitions_become_rules_in_order() {
        let tree = rule_set(|b| {
            b.node(SyntaxKind::Selector, |b| part(b, "Button"));
            b.node(SyntaxKind::Rule, |b| {
                property(b, None, "opacity");
                b.token(TokenKind::Value, "0.5");
            });
            b.node(SyntaxKind::Transition, |b| {
                b.token(TokenKind::Argument, "opacity");
                b.token(TokenKind::Argument, "0.2");
                b.token(TokenKind::Argument, "ease-out");
            });
        });

        let rule_set = only_rule_set(&tree);
        assert_eq!(rule_set.rules().len(), 2);
        let transitions: Vec<_> = rule_set.transitions().collect();
        assert_eq!(transitions.len(), 1);
        assert_eq!(transitions[0].name(), TRANSITION);
        assert_eq!(transitions[0].arguments(), ["opacity", "0.2", "ease-out"]);
        assert!(!rule_set.rules()[0].is_transition());
    }

    #[test]
    fn event_trigger_flags_from_arguments() {
        let tree = rule_set(|b| {
            b.node(SyntaxKind::Selector, |b| part(b, "Button"));
            b.node(SyntaxKind::EventTrigger, |b| {
                b.token(TokenKind::Identifier, "Click");
                b.token(TokenKind::Argument, "set-handled");
                b.node(SyntaxKind::PlaySoundAction, |b| {
                    b.token(TokenKind::Value, "click.wav");
                });
                b.node(SyntaxKind::PlayStoryboardAction, |b| {
                    b.token(TokenKind::Identifier, "pulse");
                    b.node(SyntaxKind::Selector, |b| part(b, "Border"));
                });
            });
        });

        let rule_set = only_rule_set(&tree);
        let trigger = rule_set.event_triggers().next().unwrap();
        assert_eq!(trigger.event(), "Click");
        assert!(!trigger.handled());
        assert!(trigger.set_handled());
        assert_eq!(
            trigger.actions()[0],
            TriggerAction::PlaySound {
                asset: Segment::from("click.wav")
            }
        );
        match &trigger.actions()[1] {
            TriggerAction::PlayStoryboard {
                storyboard,
                selector: Some(selector),
            } => {
                assert_eq!(storyboard, "pulse");
                assert_eq!(selector.to_string(), "Border");
            }
            other => panic!("unexpected action {other:?}"),
        }
    }

    #[test]
    fn argument_spelling_must_match_exactly() {
        let tree = rule_set(|b| {
            b.node(SyntaxKind::EventTrigger, |b| {
                b.token(TokenKind::Identifier, "Click");
                b.token(TokenKind::Argument, "Handled");
                b.token(TokenKind::Argument, "handled");
            });
        });
        let trigger = only_rule_set(&tree).event_triggers().next().cloned().unwrap();
        assert!(trigger.handled());
        assert!(!trigger.set_handled());
    }

    #[test]
    fn unknown_operator_is_internal_error() {
        let tree = rule_set(|b| {
            b.node(SyntaxKind::PropertyTrigger, |b| {
                b.node(SyntaxKind::Condition, |b| {
                    property(b, None, "IsEnabled");
                    b.token(TokenKind::Operator, "=~");
                    b.token(TokenKind::Value, "true");
                });
            });
        });
        let err = compile(&tree).unwrap_err();
        assert!(matches!(
            err,
            StyleError::Internal(InternalError::UnknownOperator(ref op)) if op == "=~"
        ));
    }

    #[test]
    fn unexpected_top_level_node_is_internal_error() {
        let mut builder = TreeBuilder::new();
        builder.node(SyntaxKind::Keyframe, |_| {});
        let err = compile(&builder.finish()).unwrap_err();
        assert!(matches!(
            err,
            StyleError::Internal(InternalError::UnexpectedNode {
                parent: SyntaxKind::Document,
                found: SyntaxKind::Keyframe
            })
        ));
    }

    #[test]
    fn missing_value_is_internal_error() {
        let tree = rule_set(|b| {
            b.node(SyntaxKind::Rule, |b| property(b, None, "margin"));
        });
        let err = compile(&tree).unwrap_err();
        assert!(matches!(
            err,
            StyleError::Internal(InternalError::MissingToken {
                node: SyntaxKind::Rule,
                token: TokenKind::Value
            })
        ));
    }

    #[test]
    fn error_diagnostics_stop_compilation() {
        let mut builder = TreeBuilder::new();
        builder.node(SyntaxKind::RuleSet, |b| {
            b.diagnostic(Diagnostic::error(DiagnosticCode::S102, Span::new(0, 0)).build());
            b.node(SyntaxKind::Rule, |b| {
                b.diagnostic(Diagnostic::error(DiagnosticCode::S103, Span::new(0, 0)).build());
            });
        });
        let err = compile(&builder.finish()).unwrap_err();
        let StyleError::Compile(err) = err else {
            panic!("expected a compile error, got {err:?}");
        };
        assert_eq!(err.diagnostics().len(), 2);
        assert_eq!(err.to_string().lines().count(), 2);
    }

    #[test]
    fn warnings_only_fail_when_configured() {
        let mut builder = TreeBuilder::new();
        builder.diagnostic(Diagnostic::warning(DiagnosticCode::S100, Span::new(0, 0)).build());
        let tree = builder.finish();

        assert!(compile(&tree).is_ok());
        let strict = Compiler::with_options(CompilerOptions {
            warnings_as_errors: true,
            ..CompilerOptions::default()
        });
        assert!(matches!(strict.compile(&tree), Err(StyleError::Compile(_))));
    }
}
