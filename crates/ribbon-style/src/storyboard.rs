//! Storyboard compilation.

use log::{debug, trace};
use ribbon_core::Segment;
use smallvec::SmallVec;

use crate::compiler::{Compiler, property_name, required_node, required_token, unexpected};
use crate::error::{InternalError, StyleError};
use crate::model::{Animation, Keyframe, LoopBehavior, Navigation, Storyboard, StoryboardTarget};
use crate::syntax::{SyntaxKind, SyntaxNode, TokenKind};

impl Compiler {
    pub(crate) fn storyboard(&self, node: &SyntaxNode) -> Result<Storyboard, StyleError> {
        let name = required_token(node, TokenKind::Identifier)?.text.clone();
        let loop_behavior = match node.token(TokenKind::LoopBehavior) {
            Some(token) => LoopBehavior::from_keyword(&token.text)
                .ok_or_else(|| InternalError::UnknownLoopBehavior(token.text.to_string()))?,
            None => LoopBehavior::default(),
        };

        let mut targets = Vec::new();
        for child in node.nodes() {
            if child.kind != SyntaxKind::StoryboardTarget {
                return Err(unexpected(node, child.kind).into());
            }
            targets.push(self.storyboard_target(child)?);
        }

        debug!("storyboard '{name}': {} targets", targets.len());
        Ok(Storyboard {
            name,
            loop_behavior,
            targets,
        })
    }

    fn storyboard_target(&self, node: &SyntaxNode) -> Result<StoryboardTarget, StyleError> {
        let mut selector = None;
        let mut animations = Vec::new();
        for child in node.nodes() {
            match child.kind {
                SyntaxKind::Selector => selector = Some(self.selector(child)?),
                SyntaxKind::Animation => animations.push(animation(child)?),
                found => return Err(unexpected(node, found).into()),
            }
        }

        let mut filter: SmallVec<[Segment; 1]> = node
            .tokens_of(TokenKind::TypeName)
            .map(|token| token.text.clone())
            .collect();
        if filter.is_empty() {
            filter.push(Segment::from(self.options.base_element_type.as_str()));
        }

        Ok(StoryboardTarget {
            selector,
            filter,
            animations,
        })
    }
}

fn animation(node: &SyntaxNode) -> Result<Animation, StyleError> {
    let property = property_name(required_node(node, SyntaxKind::PropertyName)?)?;

    let mut navigation = None;
    let mut keyframes = Vec::new();
    for child in node.nodes() {
        match child.kind {
            SyntaxKind::PropertyName => {}
            SyntaxKind::Navigation => navigation = Some(self::navigation(child)?),
            SyntaxKind::Keyframe => keyframes.push(keyframe(child)?),
            found => return Err(unexpected(node, found).into()),
        }
    }

    Ok(Animation {
        property,
        navigation,
        keyframes,
    })
}

fn navigation(node: &SyntaxNode) -> Result<Navigation, InternalError> {
    // TODO: index navigation (`items[2]`) needs an indexed target in the model.
    if let Some(index) = node.token(TokenKind::Index) {
        trace!("dropping unsupported navigation index '{}'", index.text);
    }
    Ok(Navigation {
        property: required_token(node, TokenKind::Identifier)?.text.clone(),
        target_type: required_token(node, TokenKind::TypeName)?.text.clone(),
    })
}

fn keyframe(node: &SyntaxNode) -> Result<Keyframe, StyleError> {
    let time = required_token(node, TokenKind::Time)?;
    let seconds = time
        .text
        .parse::<f32>()
        .map_err(|source| StyleError::InvalidTime {
            text: time.text.to_string(),
            source,
        })?;

    Ok(Keyframe {
        time: seconds,
        value: required_token(node, TokenKind::Value)?.text.clone(),
        easing: node.token(TokenKind::Easing).map(|token| token.text.clone()),
    })
}
