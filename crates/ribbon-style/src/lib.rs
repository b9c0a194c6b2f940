//! # ribbon-style - stylesheet compiler
//!
//! Lowers a parsed stylesheet [`SyntaxTree`] into an immutable [`Document`]
//! of rule sets and storyboards. Parsing source text is done upstream; the
//! node shapes the compiler reads are listed in [`syntax`].
//!
//! ```ignore
//! use ribbon_style::{compile, StyleError};
//!
//! match compile(&tree) {
//!     Ok(document) => apply(document.rule_sets()),
//!     Err(StyleError::Compile(errors)) => report(errors.diagnostics()),
//!     Err(other) => panic!("stylesheet compiler bug: {other}"),
//! }
//! ```

pub mod compiler;
pub mod error;
pub mod model;
pub mod options;
mod storyboard;
pub mod syntax;

pub use compiler::{Compiler, compile};
pub use error::{CompileError, ConfigError, InternalError, StyleError};
pub use model::{
    Animation, Comparison, Condition, Document, EventTrigger, Keyframe, LoopBehavior, Navigation,
    PropertyName, PropertyTrigger, Qualifier, Rule, RuleSet, Selector, SelectorPart, Storyboard,
    StoryboardTarget, TRANSITION, Trigger, TriggerAction,
};
pub use options::CompilerOptions;
pub use syntax::{
    SyntaxElement, SyntaxKind, SyntaxNode, SyntaxToken, SyntaxTree, TokenKind, TreeBuilder,
};
