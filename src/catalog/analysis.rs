//! Structural analysis of piece templates
//!
//! Splits a template's top-level structures into the floor and its walls,
//! and separates walls that hold a doorway from blind ones. Authoring aid
//! only; generation never consults it.

use serde::Serialize;

use super::schema::PieceTemplate;

/// Result of analyzing one template
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PieceAnalysis {
    /// Lowest top-level structure, if the template has any
    pub floor: Option<String>,
    /// Walls holding at least one connector marker
    pub doorway_walls: Vec<String>,
    /// Walls without any connector marker
    pub blind_walls: Vec<String>,
}

impl PieceAnalysis {
    pub fn wall_count(&self) -> usize {
        self.doorway_walls.len() + self.blind_walls.len()
    }
}

/// Classify the top-level structures of a template
///
/// The floor is the structure with the lowest local height; on a tie the
/// first one in authoring order wins.
pub fn analyze_template(template: &PieceTemplate) -> PieceAnalysis {
    let mut analysis = PieceAnalysis::default();

    let Some((floor_index, floor)) = template
        .nodes
        .iter()
        .enumerate()
        .reduce(|lowest, candidate| {
            if candidate.1.position[1] < lowest.1.position[1] {
                candidate
            } else {
                lowest
            }
        })
    else {
        return analysis;
    };

    tracing::debug!(
        "{}: floor '{}' at y={}",
        template.name(),
        floor.name,
        floor.position[1]
    );
    analysis.floor = Some(floor.name.clone());

    for (index, node) in template.nodes.iter().enumerate() {
        if index == floor_index {
            continue;
        }

        if node.contains_connector() {
            tracing::debug!("{}: doorway wall '{}'", template.name(), node.name);
            analysis.doorway_walls.push(node.name.clone());
        } else {
            tracing::debug!("{}: blind wall '{}'", template.name(), node.name);
            analysis.blind_walls.push(node.name.clone());
        }
    }

    analysis
}
