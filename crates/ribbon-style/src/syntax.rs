//! The syntax tree the compiler consumes.
//!
//! Parsing stylesheet text is done upstream; this module fixes the shape the
//! parser must produce. Each node lists the children the compiler reads:
//!
//! | Node                  | Children                                                            |
//! |-----------------------|---------------------------------------------------------------------|
//! | `Document`            | `RuleSet` and `Storyboard` nodes                                    |
//! | `RuleSet`             | `Selector` nodes, then `Rule`, `Transition` and trigger nodes       |
//! | `Selector`            | `SelectorPart` nodes, each optionally preceded by `ChildQualifier`  |
//! | `SelectorPart`        | `Exact`?, `TypeName` or `Star`?, `Id`?, `PseudoClass`?, `Class`*    |
//! | `PropertyName`        | `TypeName`? (attached owner), `Identifier`                          |
//! | `Rule`                | `PropertyName`, `Value`, `Important`?                               |
//! | `Transition`          | `Argument`*                                                         |
//! | `PropertyTrigger`     | `Condition`+, action nodes, `Important`?                            |
//! | `Condition`           | `PropertyName`, `Operator`, `Value`                                 |
//! | `EventTrigger`        | `Identifier` (event), `Argument`*, action nodes, `Important`?       |
//! | `PlayStoryboardAction`| `Identifier` (storyboard), `Selector`?                              |
//! | `PlaySoundAction`     | `Value` (asset id)                                                  |
//! | `SetAction`           | `PropertyName`, `Selector`?, `Value`                                |
//! | `Storyboard`          | `Identifier` (name), `LoopBehavior`?, `StoryboardTarget`*           |
//! | `StoryboardTarget`    | `Selector`?, `TypeName`* (filter), `Animation`*                     |
//! | `Animation`           | `PropertyName`, `Navigation`?, `Keyframe`*                          |
//! | `Navigation`          | `Identifier`, `TypeName`, `Index`?                                  |
//! | `Keyframe`            | `Time`, `Value`, `Easing`?                                          |
//!
//! Token text never includes sigils: a `Class` token for `.primary` holds
//! `primary`.

use std::sync::Arc;

use log::warn;
use ribbon_core::{Diagnostic, Segment, Span};

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum SyntaxKind {
    Document,
    RuleSet,
    Selector,
    SelectorPart,
    PropertyName,
    Rule,
    Transition,
    PropertyTrigger,
    Condition,
    EventTrigger,
    PlayStoryboardAction,
    PlaySoundAction,
    SetAction,
    Storyboard,
    StoryboardTarget,
    Animation,
    Navigation,
    Keyframe,
}

impl SyntaxKind {
    pub fn is_action(self) -> bool {
        matches!(
            self,
            SyntaxKind::PlayStoryboardAction | SyntaxKind::PlaySoundAction | SyntaxKind::SetAction
        )
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum TokenKind {
    Identifier,
    TypeName,
    /// `*`, any element type.
    Star,
    /// `^`, match the type exactly rather than including subtypes.
    Exact,
    Id,
    PseudoClass,
    Class,
    /// `>` visual child, `>>` templated child, `/` logical child.
    ChildQualifier,
    Value,
    Important,
    Operator,
    Argument,
    LoopBehavior,
    Easing,
    Time,
    Index,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SyntaxToken {
    pub kind: TokenKind,
    pub text: Segment,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq)]
pub enum SyntaxElement {
    Node(SyntaxNode),
    Token(SyntaxToken),
}

#[derive(Clone, Debug, PartialEq)]
pub struct SyntaxNode {
    pub kind: SyntaxKind,
    pub span: Span,
    pub children: Vec<SyntaxElement>,
    pub diagnostics: Vec<Diagnostic>,
}

impl SyntaxNode {
    pub fn new(kind: SyntaxKind, span: Span) -> Self {
        Self {
            kind,
            span,
            children: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    /// Child nodes in order, skipping tokens.
    pub fn nodes(&self) -> impl Iterator<Item = &SyntaxNode> {
        self.children.iter().filter_map(|child| match child {
            SyntaxElement::Node(node) => Some(node),
            SyntaxElement::Token(_) => None,
        })
    }

    /// Direct tokens in order, skipping nodes.
    pub fn tokens(&self) -> impl Iterator<Item = &SyntaxToken> {
        self.children.iter().filter_map(|child| match child {
            SyntaxElement::Token(token) => Some(token),
            SyntaxElement::Node(_) => None,
        })
    }

    pub fn tokens_of(&self, kind: TokenKind) -> impl Iterator<Item = &SyntaxToken> {
        self.tokens().filter(move |token| token.kind == kind)
    }

    pub fn token(&self, kind: TokenKind) -> Option<&SyntaxToken> {
        self.tokens_of(kind).next()
    }

    pub fn has_token(&self, kind: TokenKind) -> bool {
        self.token(kind).is_some()
    }

    pub fn node(&self, kind: SyntaxKind) -> Option<&SyntaxNode> {
        self.nodes().find(|node| node.kind == kind)
    }

    /// Visit this node's diagnostics and those of every descendant, in
    /// document order.
    pub fn walk_diagnostics<'a>(&'a self, visit: &mut impl FnMut(&'a Diagnostic)) {
        self.diagnostics.iter().for_each(&mut *visit);
        for node in self.nodes() {
            node.walk_diagnostics(visit);
        }
    }
}

/// A parsed stylesheet.
#[derive(Clone, Debug, PartialEq)]
pub struct SyntaxTree {
    root: SyntaxNode,
    source: Arc<str>,
}

impl SyntaxTree {
    pub fn new(root: SyntaxNode, source: Arc<str>) -> Self {
        Self { root, source }
    }

    pub fn root(&self) -> &SyntaxNode {
        &self.root
    }

    /// The text token segments point into.
    pub fn source(&self) -> &Arc<str> {
        &self.source
    }

    /// Every diagnostic in the tree, in document order.
    pub fn diagnostics(&self) -> Vec<&Diagnostic> {
        let mut all = Vec::new();
        self.root.walk_diagnostics(&mut |diagnostic| all.push(diagnostic));
        all
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics().iter().any(|d| d.is_error())
    }
}

enum PendingElement {
    Node(PendingNode),
    Token(TokenKind, Span),
}

struct PendingNode {
    kind: SyntaxKind,
    start: u32,
    end: u32,
    children: Vec<PendingElement>,
    diagnostics: Vec<Diagnostic>,
}

impl PendingNode {
    fn open(kind: SyntaxKind, start: u32) -> Self {
        Self {
            kind,
            start,
            end: start,
            children: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    fn into_node(self, source: &Arc<str>) -> SyntaxNode {
        let children = self
            .children
            .into_iter()
            .map(|child| match child {
                PendingElement::Node(node) => SyntaxElement::Node(node.into_node(source)),
                PendingElement::Token(kind, span) => SyntaxElement::Token(SyntaxToken {
                    kind,
                    text: Segment::new(Arc::clone(source), span.range()).unwrap_or_default(),
                    span,
                }),
            })
            .collect();
        SyntaxNode {
            kind: self.kind,
            span: Span::new(self.start, self.end),
            children,
            diagnostics: self.diagnostics,
        }
    }
}

/// Builds a [`SyntaxTree`] top-down, the way a recursive descent parser
/// walks its input.
///
/// Token text is collected into one shared source buffer, separated by
/// single spaces, so spans and segments stay consistent.
///
/// ```ignore
/// let mut builder = TreeBuilder::new();
/// builder.start_node(SyntaxKind::RuleSet);
/// builder.start_node(SyntaxKind::Selector);
/// builder.start_node(SyntaxKind::SelectorPart);
/// builder.token(TokenKind::TypeName, "Button");
/// builder.finish_node();
/// builder.finish_node();
/// builder.finish_node();
/// let tree = builder.finish();
/// ```
pub struct TreeBuilder {
    text: String,
    stack: Vec<PendingNode>,
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeBuilder {
    /// Start a tree whose root is an open `Document` node.
    pub fn new() -> Self {
        Self {
            text: String::new(),
            stack: vec![PendingNode::open(SyntaxKind::Document, 0)],
        }
    }

    fn offset(&self) -> u32 {
        self.text.len() as u32
    }

    fn current(&mut self) -> &mut PendingNode {
        // The root is never popped, so the stack is never empty.
        let last = self.stack.len() - 1;
        &mut self.stack[last]
    }

    pub fn start_node(&mut self, kind: SyntaxKind) -> &mut Self {
        let start = self.offset();
        self.stack.push(PendingNode::open(kind, start));
        self
    }

    /// Open a `kind` node, let `build` fill it, then close it.
    pub fn node(&mut self, kind: SyntaxKind, build: impl FnOnce(&mut Self)) -> &mut Self {
        self.start_node(kind);
        build(self);
        self.finish_node()
    }

    /// Append a token to the open node and return its span.
    pub fn token(&mut self, kind: TokenKind, text: &str) -> Span {
        if !self.text.is_empty() {
            self.text.push(' ');
        }
        let start = self.offset();
        self.text.push_str(text);
        let span = Span::new(start, self.offset());
        self.current().children.push(PendingElement::Token(kind, span));
        span
    }

    /// Attach a diagnostic to the open node.
    pub fn diagnostic(&mut self, diagnostic: Diagnostic) -> &mut Self {
        self.current().diagnostics.push(diagnostic);
        self
    }

    /// Span from the open node's start to the current end of input.
    pub fn current_span(&self) -> Span {
        let start = self.stack.last().map_or(0, |node| node.start);
        Span::new(start, self.offset())
    }

    pub fn finish_node(&mut self) -> &mut Self {
        if self.stack.len() == 1 {
            warn!("finish_node called with no open node; ignoring");
            return self;
        }
        let end = self.offset();
        if let Some(mut node) = self.stack.pop() {
            node.end = end;
            self.current().children.push(PendingElement::Node(node));
        }
        self
    }

    /// Close any nodes still open and produce the tree.
    pub fn finish(mut self) -> SyntaxTree {
        while self.stack.len() > 1 {
            self.finish_node();
        }
        let end = self.offset();
        let source: Arc<str> = Arc::from(self.text);
        let root = match self.stack.pop() {
            Some(mut root) => {
                root.end = end;
                root.into_node(&source)
            }
            None => SyntaxNode::new(SyntaxKind::Document, Span::new(0, end)),
        };
        SyntaxTree::new(root, source)
    }
}
