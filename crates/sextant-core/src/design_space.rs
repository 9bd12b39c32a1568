//! The static design space: named axes with token/pattern poles and the
//! canonical position of every known platform.
//!
//! Geometry here is embedding-free. Two positions are compared with
//!
//! ```text
//! similarity = 1 − ‖a − b‖ / 4
//! ```
//!
//! where 4 is the largest distance possible inside the `[-1, 1]⁴` cube.

use serde::{Deserialize, Serialize};

use crate::models::{Axis, SemanticPosition};

/// Largest Euclidean distance between two points of `[-1, 1]⁴`.
pub const MAX_DISTANCE: f64 = 4.0;

/// Positional similarity in `[0, 1]`.
pub fn position_similarity(a: &SemanticPosition, b: &SemanticPosition) -> f64 {
    1.0 - a.distance(b) / MAX_DISTANCE
}

/// One end of a design axis.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Pole {
    pub label: String,
    pub tokens: Vec<String>,
    pub patterns: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignSpaceAxis {
    pub id: Axis,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub negative: Pole,
    #[serde(default)]
    pub positive: Pole,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformDefinition {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub canonical_position: SemanticPosition,
    #[serde(default)]
    pub primary_tokens: Vec<String>,
    /// Words that mark a source file as belonging to this platform.
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Projection template; `{reference}` and `{platform}` are substituted.
    #[serde(default)]
    pub expression: String,
}

impl PlatformDefinition {
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.id
        } else {
            &self.name
        }
    }

    /// Render this platform's projection template for `reference`.
    pub fn describe_projection(&self, reference: &str) -> String {
        let template = if self.expression.is_empty() {
            "Express {reference} in the {platform} visual language."
        } else {
            self.expression.as_str()
        };
        template
            .replace("{reference}", reference)
            .replace("{platform}", self.display_name())
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DesignSpace {
    pub axes: Vec<DesignSpaceAxis>,
    pub platforms: Vec<PlatformDefinition>,
}

impl DesignSpace {
    /// Check that every dimension of [`SemanticPosition`] has exactly one
    /// axis definition and that platform ids are unique.
    pub fn validate(&self) -> Result<(), String> {
        for axis in Axis::ALL {
            let count = self.axes.iter().filter(|a| a.id == axis).count();
            if count != 1 {
                return Err(format!(
                    "design space must define axis '{}' exactly once (found {})",
                    axis.id(),
                    count
                ));
            }
        }
        for (i, p) in self.platforms.iter().enumerate() {
            if self.platforms[..i].iter().any(|q| q.id == p.id) {
                return Err(format!("duplicate platform id '{}'", p.id));
            }
        }
        Ok(())
    }

    pub fn axis(&self, axis: Axis) -> Option<&DesignSpaceAxis> {
        self.axes.iter().find(|a| a.id == axis)
    }

    pub fn platform(&self, id: &str) -> Option<&PlatformDefinition> {
        self.platforms.iter().find(|p| p.id == id)
    }

    /// Label of one pole of `axis`, falling back to the built-in names.
    pub fn pole_label(&self, axis: Axis, positive: bool) -> String {
        let configured = self.axis(axis).map(|a| {
            if positive {
                a.positive.label.as_str()
            } else {
                a.negative.label.as_str()
            }
        });
        match configured {
            Some(label) if !label.is_empty() => label.to_string(),
            _ => {
                let (neg, pos) = axis.poles();
                if positive { pos } else { neg }.to_string()
            }
        }
    }

    /// The platform whose canonical position is most similar to `pos`.
    /// Ties keep the earlier platform in definition order.
    pub fn nearest_platform(&self, pos: &SemanticPosition) -> Option<(&PlatformDefinition, f64)> {
        let mut best: Option<(&PlatformDefinition, f64)> = None;
        for p in &self.platforms {
            let sim = position_similarity(pos, &p.canonical_position);
            match best {
                Some((_, s)) if sim <= s => {}
                _ => best = Some((p, sim)),
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn axis(id: Axis) -> DesignSpaceAxis {
        let (neg, pos) = id.poles();
        DesignSpaceAxis {
            id,
            name: id.id().to_string(),
            negative: Pole {
                label: neg.to_string(),
                tokens: vec![format!("--{}-token", neg)],
                patterns: vec![format!("{}-pattern", neg)],
            },
            positive: Pole {
                label: pos.to_string(),
                tokens: vec![format!("--{}-token", pos)],
                patterns: vec![format!("{}-pattern", pos)],
            },
        }
    }

    fn platform(id: &str, pos: SemanticPosition) -> PlatformDefinition {
        PlatformDefinition {
            id: id.to_string(),
            name: String::new(),
            canonical_position: pos,
            primary_tokens: vec![],
            keywords: vec![],
            expression: String::new(),
        }
    }

    #[test]
    fn test_identical_positions_are_fully_similar() {
        let p = SemanticPosition::new(0.3, -0.2, 0.1, 0.9);
        assert!((position_similarity(&p, &p) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_opposite_corners_have_zero_similarity() {
        let a = SemanticPosition::new(-1.0, -1.0, -1.0, -1.0);
        let b = SemanticPosition::new(1.0, 1.0, 1.0, 1.0);
        assert!(position_similarity(&a, &b).abs() < 1e-12);
    }

    #[test]
    fn test_validate_requires_every_axis_once() {
        let mut space = DesignSpace {
            axes: Axis::ALL.iter().map(|&a| axis(a)).collect(),
            platforms: vec![],
        };
        assert!(space.validate().is_ok());
        space.axes.pop();
        assert!(space.validate().is_err());
        space.axes.push(axis(Axis::TerminalOrganic));
        assert!(space.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_duplicate_platform() {
        let space = DesignSpace {
            axes: Axis::ALL.iter().map(|&a| axis(a)).collect(),
            platforms: vec![
                platform("a", SemanticPosition::default()),
                platform("a", SemanticPosition::default()),
            ],
        };
        assert!(space.validate().is_err());
    }

    #[test]
    fn test_nearest_platform_ties_keep_definition_order() {
        let space = DesignSpace {
            axes: vec![],
            platforms: vec![
                platform("first", SemanticPosition::new(0.5, 0.0, 0.0, 0.0)),
                platform("second", SemanticPosition::new(-0.5, 0.0, 0.0, 0.0)),
            ],
        };
        let (p, _) = space.nearest_platform(&SemanticPosition::default()).unwrap();
        assert_eq!(p.id, "first");
    }

    #[test]
    fn test_pole_label_falls_back_to_builtin() {
        let space = DesignSpace::default();
        assert_eq!(space.pole_label(Axis::CoolWarm, true), "warm");
        assert_eq!(space.pole_label(Axis::TerminalOrganic, false), "terminal");
    }

    #[test]
    fn test_describe_projection_substitutes() {
        let mut p = platform("astrolabe", SemanticPosition::default());
        p.name = "Astrolabe".to_string();
        p.expression = "{reference} rendered as {platform} brass".to_string();
        assert_eq!(p.describe_projection("a card"), "a card rendered as Astrolabe brass");
    }
}
