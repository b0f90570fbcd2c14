use std::collections::VecDeque;

use sheetquote_core::drawing::{Drawing, Entity};
use tracing::debug;

use crate::errors::EngineError;

const DEFAULT_MAX_DEPTH: usize = 16;
const DEFAULT_MAX_ENTITIES: usize = 100_000;

/// 块展开的硬性上限，超限即失败，不做重试或放宽。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlattenLimits {
    /// 单条展开路径允许的最大嵌套深度。
    pub max_depth: usize,
    /// 已输出与待处理实体数之和的上限。
    pub max_entities: usize,
}

impl Default for FlattenLimits {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_entities: DEFAULT_MAX_ENTITIES,
        }
    }
}

/// 把图纸中的块参照逐层展开为不含 `BlockReference` 的实体序列。
///
/// 使用显式工作队列：展开得到的子实体按原顺序压回队首，因此输出保持图纸顺序。
/// 每个队列元素携带其展开深度，自引用或互相引用的块会在深度上限处失败。
pub fn flatten(drawing: &Drawing, limits: &FlattenLimits) -> Result<Vec<Entity>, EngineError> {
    let mut queue: VecDeque<(Entity, usize)> =
        drawing.entities().map(|entity| (entity.clone(), 0)).collect();
    if queue.len() > limits.max_entities {
        return Err(EngineError::ResourceLimitExceeded {
            limit: limits.max_entities,
        });
    }

    let mut output = Vec::with_capacity(queue.len());
    let mut expansions = 0usize;
    let mut deepest = 0usize;

    while let Some((entity, depth)) = queue.pop_front() {
        let reference = match entity {
            Entity::BlockReference(reference) => reference,
            other => {
                output.push(other);
                continue;
            }
        };

        let block = drawing
            .block(&reference.block_name)
            .ok_or_else(|| EngineError::UnknownBlock(reference.block_name.clone()))?;

        let child_depth = depth + 1;
        if child_depth > limits.max_depth {
            return Err(EngineError::RecursionLimitExceeded {
                block: reference.block_name,
                limit: limits.max_depth,
            });
        }
        if output.len() + queue.len() + block.entities.len() > limits.max_entities {
            return Err(EngineError::ResourceLimitExceeded {
                limit: limits.max_entities,
            });
        }

        let placement = block.placement(&reference.transform);
        for child in block.entities.iter().rev() {
            queue.push_front((child.transformed(&placement), child_depth));
        }
        expansions += 1;
        deepest = deepest.max(child_depth);
    }

    debug!(
        entities = output.len(),
        expansions,
        max_depth = deepest,
        "块参照展开完成"
    );
    Ok(output)
}

#[cfg(test)]
mod tests {
    use std::f64::consts::FRAC_PI_2;

    use sheetquote_core::drawing::{BlockDefinition, Circle, Line};
    use sheetquote_core::geometry::{Point2, Transform2, Vector2};

    use super::*;

    fn line(x1: f64, y1: f64, x2: f64, y2: f64) -> Entity {
        Entity::Line(Line {
            start: Point2::new(x1, y1),
            end: Point2::new(x2, y2),
        })
    }

    fn reference(name: &str, transform: Transform2) -> Entity {
        Entity::BlockReference(sheetquote_core::drawing::BlockReference {
            block_name: name.to_string(),
            transform,
        })
    }

    #[test]
    fn flat_drawing_is_unchanged() {
        let mut drawing = Drawing::new();
        drawing.add_line(Point2::new(0.0, 0.0), Point2::new(3.0, 4.0));
        drawing.add_circle(Point2::new(1.0, 1.0), 0.5);

        let flat = flatten(&drawing, &FlattenLimits::default()).expect("flatten");
        let original: Vec<Entity> = drawing.entities().cloned().collect();
        assert_eq!(flat, original);

        let mut again = Drawing::new();
        for entity in flat.clone() {
            again.add_entity(entity);
        }
        let twice = flatten(&again, &FlattenLimits::default()).expect("flatten again");
        assert_eq!(twice, flat);
    }

    #[test]
    fn references_are_expanded_with_transform() {
        let mut drawing = Drawing::new();
        drawing.add_block(BlockDefinition::new("TAB", vec![line(0.0, 0.0, 1.0, 0.0)]));
        drawing.add_line(Point2::new(-5.0, 0.0), Point2::new(-4.0, 0.0));
        drawing.add_block_reference(
            "TAB",
            Transform2::new(Vector2::new(10.0, 10.0), FRAC_PI_2, 2.0),
        );
        drawing.add_line(Point2::new(5.0, 0.0), Point2::new(6.0, 0.0));

        let flat = flatten(&drawing, &FlattenLimits::default()).expect("flatten");
        assert_eq!(flat.len(), 3);
        assert!(flat.iter().all(|entity| !entity.is_block_reference()));
        match &flat[1] {
            Entity::Line(mapped) => {
                assert!((mapped.start.x() - 10.0).abs() < 1e-9);
                assert!((mapped.start.y() - 10.0).abs() < 1e-9);
                assert!((mapped.end.x() - 10.0).abs() < 1e-9);
                assert!((mapped.end.y() - 12.0).abs() < 1e-9);
            }
            other => panic!("expected transformed line, got {other:?}"),
        }
    }

    #[test]
    fn nested_references_compose_and_respect_base_point() {
        let mut drawing = Drawing::new();
        let mut hole = BlockDefinition::new(
            "HOLE",
            vec![Entity::Circle(Circle {
                center: Point2::new(1.0, 1.0),
                radius: 1.0,
            })],
        );
        hole.base_point = Point2::new(1.0, 1.0);
        drawing.add_block(hole);
        drawing.add_block(BlockDefinition::new(
            "PATTERN",
            vec![
                reference("HOLE", Transform2::translation(Vector2::new(0.0, 0.0))),
                reference("HOLE", Transform2::translation(Vector2::new(10.0, 0.0))),
            ],
        ));
        drawing.add_block_reference(
            "PATTERN",
            Transform2::new(Vector2::new(100.0, 50.0), 0.0, 3.0),
        );

        let flat = flatten(&drawing, &FlattenLimits::default()).expect("flatten");
        let circles: Vec<&Circle> = flat
            .iter()
            .filter_map(|entity| match entity {
                Entity::Circle(circle) => Some(circle),
                _ => None,
            })
            .collect();
        assert_eq!(circles.len(), 2);
        assert!((circles[0].center.x() - 100.0).abs() < 1e-9);
        assert!((circles[0].center.y() - 50.0).abs() < 1e-9);
        assert!((circles[1].center.x() - 130.0).abs() < 1e-9);
        assert!((circles[0].radius - 3.0).abs() < 1e-9);
    }

    #[test]
    fn unknown_block_is_reported_by_name() {
        let mut drawing = Drawing::new();
        drawing.add_block_reference("MISSING", Transform2::identity());
        let err = flatten(&drawing, &FlattenLimits::default()).unwrap_err();
        assert_eq!(err, EngineError::UnknownBlock("MISSING".to_string()));
    }

    #[test]
    fn self_referencing_block_hits_depth_limit() {
        let mut drawing = Drawing::new();
        drawing.add_block(BlockDefinition::new(
            "LOOP",
            vec![
                line(0.0, 0.0, 1.0, 0.0),
                reference("LOOP", Transform2::identity()),
            ],
        ));
        drawing.add_block_reference("LOOP", Transform2::identity());

        let limits = FlattenLimits {
            max_depth: 8,
            max_entities: 10_000,
        };
        let err = flatten(&drawing, &limits).unwrap_err();
        assert_eq!(
            err,
            EngineError::RecursionLimitExceeded {
                block: "LOOP".to_string(),
                limit: 8,
            }
        );
    }

    #[test]
    fn mutually_recursive_blocks_hit_depth_limit() {
        let mut drawing = Drawing::new();
        drawing.add_block(BlockDefinition::new(
            "A",
            vec![reference("B", Transform2::identity())],
        ));
        drawing.add_block(BlockDefinition::new(
            "B",
            vec![reference("A", Transform2::identity())],
        ));
        drawing.add_block_reference("A", Transform2::identity());

        let err = flatten(&drawing, &FlattenLimits::default()).unwrap_err();
        assert!(matches!(err, EngineError::RecursionLimitExceeded { limit: 16, .. }));
    }

    #[test]
    fn layout_larger_than_limit_is_rejected_up_front() {
        let limits = FlattenLimits {
            max_depth: 16,
            max_entities: 8,
        };

        let mut at_limit = Drawing::new();
        for i in 0..8 {
            at_limit.add_line(Point2::new(i as f64, 0.0), Point2::new(i as f64, 1.0));
        }
        let flat = flatten(&at_limit, &limits).expect("exactly at the limit");
        assert_eq!(flat.len(), 8);

        at_limit.add_line(Point2::new(8.0, 0.0), Point2::new(8.0, 1.0));
        assert_eq!(
            flatten(&at_limit, &limits).unwrap_err(),
            EngineError::ResourceLimitExceeded { limit: 8 }
        );
    }

    #[test]
    fn fan_out_hits_entity_limit() {
        let mut drawing = Drawing::new();
        drawing.add_block(BlockDefinition::new(
            "LEAF",
            (0..10).map(|i| line(i as f64, 0.0, i as f64, 1.0)).collect(),
        ));
        drawing.add_block(BlockDefinition::new(
            "BRANCH",
            (0..10)
                .map(|i| reference("LEAF", Transform2::translation(Vector2::new(0.0, i as f64))))
                .collect(),
        ));
        for _ in 0..10 {
            drawing.add_block_reference("BRANCH", Transform2::identity());
        }

        let limits = FlattenLimits {
            max_depth: 16,
            max_entities: 500,
        };
        let err = flatten(&drawing, &limits).unwrap_err();
        assert_eq!(err, EngineError::ResourceLimitExceeded { limit: 500 });

        let generous = FlattenLimits {
            max_depth: 16,
            max_entities: 1_000,
        };
        let flat = flatten(&drawing, &generous).expect("within limits");
        assert_eq!(flat.len(), 1_000);
    }
}
