use std::collections::BTreeSet;
use std::f64::consts::TAU;

use sheetquote_core::drawing::Entity;
use sheetquote_core::geometry::{Bounds2D, Point2};

use crate::errors::EngineError;

const DEFAULT_MAX_SHEET_WIDTH: f64 = 1_200.0;
const DEFAULT_MAX_SHEET_HEIGHT: f64 = 2_400.0;
const DEFAULT_MIN_HOLE_FACTOR: f64 = 1.5;

/// 可制造性检查规则，单位为毫米。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DfmRules {
    pub max_sheet_width: f64,
    pub max_sheet_height: f64,
    /// 孔径下限 = 系数 × 板厚。
    pub min_hole_factor: f64,
}

impl Default for DfmRules {
    fn default() -> Self {
        Self {
            max_sheet_width: DEFAULT_MAX_SHEET_WIDTH,
            max_sheet_height: DEFAULT_MAX_SHEET_HEIGHT,
            min_hole_factor: DEFAULT_MIN_HOLE_FACTOR,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub width: f64,
    pub height: f64,
}

/// 一次度量的结果。孔数量由孔径列表长度决定，两者不会失配。
#[derive(Debug, Clone, PartialEq)]
pub struct Metrics {
    pub bounding_box: BoundingBox,
    pub cut_length: f64,
    pub hole_diameters: Vec<f64>,
    pub warnings: Vec<String>,
    pub entities_seen: BTreeSet<String>,
}

impl Metrics {
    #[inline]
    pub fn hole_count(&self) -> usize {
        self.hole_diameters.len()
    }
}

/// 单遍累加器：逐个消费已展开的实体，维护包围盒、切割长度和孔列表。
///
/// 两个累加器可以用 [`MetricsAccumulator::merge`] 合并（包围盒取分量极值、长度求和），
/// 因此按任意方式分块并行累加后合并，结果与顺序无关。
#[derive(Debug, Clone, Default)]
pub struct MetricsAccumulator {
    bounds: Bounds2D,
    cut_length: f64,
    hole_diameters: Vec<f64>,
    entities_seen: BTreeSet<String>,
}

impl MetricsAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entity: &Entity) {
        let label = entity.type_label();
        if !self.entities_seen.contains(label) {
            self.entities_seen.insert(label.to_string());
        }

        match entity {
            Entity::Line(line) => {
                self.cut_length += line.start.distance(line.end);
                self.bounds.include_point(line.start);
                self.bounds.include_point(line.end);
            }
            Entity::Circle(circle) => {
                let radius = circle.radius.abs();
                self.cut_length += TAU * radius;
                self.include_disc(circle.center, radius);
                self.hole_diameters.push(2.0 * radius);
            }
            Entity::Arc(arc) => {
                // 包围盒按整圆保守估计
                let radius = arc.radius.abs();
                self.cut_length += radius * arc.sweep();
                self.include_disc(arc.center, radius);
            }
            Entity::Polyline(polyline) => {
                self.include_path(&polyline.points, polyline.is_closed);
            }
            Entity::Spline(spline) => {
                self.include_path(&spline.samples, false);
            }
            Entity::BlockReference(_) | Entity::Unsupported { .. } => {}
        }
    }

    pub fn merge(&mut self, other: MetricsAccumulator) {
        self.bounds.include_bounds(&other.bounds);
        self.cut_length += other.cut_length;
        self.hole_diameters.extend(other.hole_diameters);
        self.entities_seen.extend(other.entities_seen);
    }

    /// 结束累加并生成可制造性警告。板厚只用于诊断，不影响几何量。
    pub fn finish(self, rules: &DfmRules, thickness_mm: f64) -> Result<Metrics, EngineError> {
        if self.bounds.is_empty() {
            return Err(EngineError::NoGeometryFound {
                entities_detected: self.entities_seen.into_iter().collect(),
            });
        }

        let bounding_box = BoundingBox {
            width: self.bounds.width(),
            height: self.bounds.height(),
        };

        let mut warnings = Vec::new();
        let oversize = bounding_box.width > rules.max_sheet_width
            || bounding_box.height > rules.max_sheet_height;
        if oversize {
            warnings.push(format!(
                "part exceeds maximum sheet size ({:.1} x {:.1} mm, limit {} x {} mm)",
                bounding_box.width,
                bounding_box.height,
                rules.max_sheet_width,
                rules.max_sheet_height
            ));
        }
        let min_diameter = rules.min_hole_factor * thickness_mm;
        for diameter in &self.hole_diameters {
            if *diameter < min_diameter {
                warnings.push(format!(
                    "hole {diameter:.2} mm may be too small for {thickness_mm} mm material"
                ));
            }
        }

        Ok(Metrics {
            bounding_box,
            cut_length: self.cut_length,
            hole_diameters: self.hole_diameters,
            warnings,
            entities_seen: self.entities_seen,
        })
    }

    fn include_disc(&mut self, center: Point2, radius: f64) {
        self.bounds
            .include_point(Point2::new(center.x() - radius, center.y() - radius));
        self.bounds
            .include_point(Point2::new(center.x() + radius, center.y() + radius));
    }

    fn include_path(&mut self, points: &[Point2], is_closed: bool) {
        for point in points {
            self.bounds.include_point(*point);
        }
        self.cut_length += points
            .windows(2)
            .map(|pair| pair[0].distance(pair[1]))
            .sum::<f64>();
        if is_closed {
            if let (Some(first), Some(last)) = (points.first(), points.last()) {
                self.cut_length += last.distance(*first);
            }
        }
    }
}

/// 对展开后的实体序列做一次完整度量。
pub fn measure<'a, I>(
    entities: I,
    rules: &DfmRules,
    thickness_mm: f64,
) -> Result<Metrics, EngineError>
where
    I: IntoIterator<Item = &'a Entity>,
{
    let mut accumulator = MetricsAccumulator::new();
    for entity in entities {
        accumulator.push(entity);
    }
    accumulator.finish(rules, thickness_mm)
}
