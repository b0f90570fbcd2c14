pub mod geometry {
    use glam::DVec2;
    use serde::{Deserialize, Serialize};

    /// 二维点，内部以 `glam::DVec2` 表示，坐标单位为毫米。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Point2(pub DVec2);

    impl Point2 {
        #[inline]
        pub fn new(x: f64, y: f64) -> Self {
            Self(DVec2::new(x, y))
        }

        #[inline]
        pub fn from_vec(vec: DVec2) -> Self {
            Self(vec)
        }

        #[inline]
        pub fn x(self) -> f64 {
            self.0.x
        }

        #[inline]
        pub fn y(self) -> f64 {
            self.0.y
        }

        /// 两点间欧氏距离。
        #[inline]
        pub fn distance(self, other: Point2) -> f64 {
            self.0.distance(other.0)
        }

        #[inline]
        pub fn as_vec2(self) -> DVec2 {
            self.0
        }
    }

    impl From<DVec2> for Point2 {
        fn from(value: DVec2) -> Self {
            Self::from_vec(value)
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Vector2(pub DVec2);

    impl Vector2 {
        #[inline]
        pub fn new(x: f64, y: f64) -> Self {
            Self(DVec2::new(x, y))
        }

        #[inline]
        pub fn zero() -> Self {
            Self(DVec2::ZERO)
        }

        #[inline]
        pub fn as_vec2(self) -> DVec2 {
            self.0
        }

        #[inline]
        pub fn x(self) -> f64 {
            self.0.x
        }

        #[inline]
        pub fn y(self) -> f64 {
            self.0.y
        }
    }

    impl From<DVec2> for Vector2 {
        fn from(value: DVec2) -> Self {
            Self(value)
        }
    }

    /// 轴对齐边界框。空框的 min 为 +∞、max 为 −∞，合并运算满足结合律与交换律。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Bounds2D {
        min: Point2,
        max: Point2,
    }

    impl Bounds2D {
        #[inline]
        pub fn empty() -> Self {
            Self {
                min: Point2::new(f64::INFINITY, f64::INFINITY),
                max: Point2::new(f64::NEG_INFINITY, f64::NEG_INFINITY),
            }
        }

        #[inline]
        pub fn is_empty(&self) -> bool {
            self.min.x() > self.max.x() || self.min.y() > self.max.y()
        }

        #[inline]
        pub fn min(&self) -> Point2 {
            self.min
        }

        #[inline]
        pub fn max(&self) -> Point2 {
            self.max
        }

        pub fn include_point(&mut self, point: Point2) {
            let min_vec = self.min.as_vec2().min(point.as_vec2());
            let max_vec = self.max.as_vec2().max(point.as_vec2());
            self.min = Point2::from_vec(min_vec);
            self.max = Point2::from_vec(max_vec);
        }

        pub fn include_bounds(&mut self, other: &Bounds2D) {
            if other.is_empty() {
                return;
            }
            self.include_point(other.min);
            self.include_point(other.max);
        }

        /// 空框宽度记为 0。
        #[inline]
        pub fn width(&self) -> f64 {
            if self.is_empty() {
                0.0
            } else {
                self.max.x() - self.min.x()
            }
        }

        #[inline]
        pub fn height(&self) -> f64 {
            if self.is_empty() {
                0.0
            } else {
                self.max.y() - self.min.y()
            }
        }
    }

    impl Default for Bounds2D {
        fn default() -> Self {
            Self::empty()
        }
    }

    /// 块参照的相似变换：先缩放、再绕原点旋转、最后平移。
    ///
    /// 仅支持等比缩放；负缩放等价于额外旋转 π（点对称）。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Transform2 {
        pub translate: Vector2,
        /// 旋转角（弧度，逆时针为正）。
        pub rotate: f64,
        pub scale: f64,
    }

    impl Transform2 {
        #[inline]
        pub fn identity() -> Self {
            Self {
                translate: Vector2::zero(),
                rotate: 0.0,
                scale: 1.0,
            }
        }

        #[inline]
        pub fn new(translate: Vector2, rotate: f64, scale: f64) -> Self {
            Self {
                translate,
                rotate,
                scale,
            }
        }

        #[inline]
        pub fn translation(offset: Vector2) -> Self {
            Self {
                translate: offset,
                ..Self::identity()
            }
        }

        pub fn apply(&self, point: Point2) -> Point2 {
            let scaled = point.as_vec2() * self.scale;
            let rotated = DVec2::from_angle(self.rotate).rotate(scaled);
            Point2::from_vec(rotated + self.translate.as_vec2())
        }

        /// 返回 `self ∘ inner`，即先应用 `inner` 再应用 `self`。
        pub fn compose(&self, inner: &Transform2) -> Transform2 {
            let origin = self.apply(Point2::from_vec(inner.translate.as_vec2()));
            Transform2 {
                translate: Vector2::from(origin.as_vec2()),
                rotate: self.rotate + inner.rotate,
                scale: self.scale * inner.scale,
            }
        }

        /// 角度在该变换下的像。负缩放会把方向整体翻转 π。
        #[inline]
        pub fn apply_angle(&self, angle: f64) -> f64 {
            if self.scale < 0.0 {
                angle + self.rotate + std::f64::consts::PI
            } else {
                angle + self.rotate
            }
        }

        #[inline]
        pub fn apply_length(&self, length: f64) -> f64 {
            length * self.scale.abs()
        }
    }

    impl Default for Transform2 {
        fn default() -> Self {
            Self::identity()
        }
    }

}

pub mod drawing {
    use std::collections::HashMap;

    use serde::{Deserialize, Serialize};

    use crate::geometry::{Point2, Transform2, Vector2};

    /// 引擎可识别的图元集合。新增图元需要同时在度量器中补充一个匹配分支。
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub enum Entity {
        Line(Line),
        Circle(Circle),
        Arc(Arc),
        Polyline(Polyline),
        Spline(Spline),
        BlockReference(BlockReference),
        /// 解码成功但无法度量的实体（文字、填充、椭圆等），仅保留类型标签。
        Unsupported { kind: String },
    }

    impl Entity {
        /// DXF 风格的类型标签，用于诊断输出。
        pub fn type_label(&self) -> &str {
            match self {
                Entity::Line(_) => "LINE",
                Entity::Circle(_) => "CIRCLE",
                Entity::Arc(_) => "ARC",
                Entity::Polyline(_) => "POLYLINE",
                Entity::Spline(_) => "SPLINE",
                Entity::BlockReference(_) => "INSERT",
                Entity::Unsupported { kind } => kind.as_str(),
            }
        }

        #[inline]
        pub fn is_block_reference(&self) -> bool {
            matches!(self, Entity::BlockReference(_))
        }

        /// 把变换作用到实体的全部坐标上。嵌套块参照会组合变换而不是立即展开。
        pub fn transformed(&self, transform: &Transform2) -> Entity {
            match self {
                Entity::Line(line) => Entity::Line(Line {
                    start: transform.apply(line.start),
                    end: transform.apply(line.end),
                }),
                Entity::Circle(circle) => Entity::Circle(Circle {
                    center: transform.apply(circle.center),
                    radius: transform.apply_length(circle.radius),
                }),
                Entity::Arc(arc) => Entity::Arc(Arc {
                    center: transform.apply(arc.center),
                    radius: transform.apply_length(arc.radius),
                    start_angle: transform.apply_angle(arc.start_angle),
                    end_angle: transform.apply_angle(arc.end_angle),
                }),
                Entity::Polyline(polyline) => Entity::Polyline(Polyline {
                    points: polyline
                        .points
                        .iter()
                        .map(|point| transform.apply(*point))
                        .collect(),
                    is_closed: polyline.is_closed,
                }),
                Entity::Spline(spline) => Entity::Spline(Spline {
                    samples: spline
                        .samples
                        .iter()
                        .map(|point| transform.apply(*point))
                        .collect(),
                }),
                Entity::BlockReference(reference) => Entity::BlockReference(BlockReference {
                    block_name: reference.block_name.clone(),
                    transform: transform.compose(&reference.transform),
                }),
                Entity::Unsupported { kind } => Entity::Unsupported { kind: kind.clone() },
            }
        }
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Line {
        pub start: Point2,
        pub end: Point2,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Circle {
        pub center: Point2,
        pub radius: f64,
    }

    /// 圆弧实体，角度以弧度储存，从 `start_angle` 逆时针扫到 `end_angle`。
    /// 解码阶段保证 `end_angle >= start_angle`。
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Arc {
        pub center: Point2,
        pub radius: f64,
        pub start_angle: f64,
        pub end_angle: f64,
    }

    impl Arc {
        /// 扫掠角（弧度）。
        #[inline]
        pub fn sweep(&self) -> f64 {
            (self.end_angle - self.start_angle).abs()
        }
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Polyline {
        /// 顶点顺序即几何顺序。
        pub points: Vec<Point2>,
        pub is_closed: bool,
    }

    /// 已重采样的样条，仅保留折线近似所需的采样点。
    ///
    /// 这是近似而非精确曲线：采样点直接取自拟合点或控制点，不做 B 样条求值。
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Spline {
        pub samples: Vec<Point2>,
    }

    impl Spline {
        /// 优先使用非空的拟合点，否则回退到控制点；两者皆空时得到零长度样条。
        pub fn from_points(fit_points: Vec<Point2>, control_points: Vec<Point2>) -> Self {
            let samples = if !fit_points.is_empty() {
                fit_points
            } else {
                control_points
            };
            Self { samples }
        }
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct BlockReference {
        pub block_name: String,
        pub transform: Transform2,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct BlockDefinition {
        pub name: String,
        /// 块内坐标在放置前先减去基点。
        pub base_point: Point2,
        pub entities: Vec<Entity>,
    }

    impl BlockDefinition {
        pub fn new(name: impl Into<String>, entities: Vec<Entity>) -> Self {
            Self {
                name: name.into(),
                base_point: Point2::new(0.0, 0.0),
                entities,
            }
        }

        /// 块实例的最终放置变换：实例变换 ∘ 平移(−基点)。
        pub fn placement(&self, instance: &Transform2) -> Transform2 {
            let offset = Vector2::new(-self.base_point.x(), -self.base_point.y());
            instance.compose(&Transform2::translation(offset))
        }
    }

    /// 解码后的图纸：布局实体序列加命名块表。
    #[derive(Debug, Default, Clone, Serialize, Deserialize)]
    pub struct Drawing {
        entities: Vec<Entity>,
        blocks: HashMap<String, BlockDefinition>,
    }

    impl Drawing {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn add_entity(&mut self, entity: Entity) {
            self.entities.push(entity);
        }

        pub fn add_line(&mut self, start: Point2, end: Point2) {
            self.add_entity(Entity::Line(Line { start, end }));
        }

        pub fn add_circle(&mut self, center: Point2, radius: f64) {
            self.add_entity(Entity::Circle(Circle { center, radius }));
        }

        pub fn add_arc(&mut self, center: Point2, radius: f64, start_angle: f64, end_angle: f64) {
            self.add_entity(Entity::Arc(Arc {
                center,
                radius,
                start_angle,
                end_angle,
            }));
        }

        pub fn add_polyline<I>(&mut self, points: I, is_closed: bool)
        where
            I: IntoIterator<Item = Point2>,
        {
            self.add_entity(Entity::Polyline(Polyline {
                points: points.into_iter().collect(),
                is_closed,
            }));
        }

        pub fn add_spline(&mut self, fit_points: Vec<Point2>, control_points: Vec<Point2>) {
            self.add_entity(Entity::Spline(Spline::from_points(
                fit_points,
                control_points,
            )));
        }

        pub fn add_block_reference(
            &mut self,
            block_name: impl Into<String>,
            transform: Transform2,
        ) {
            self.add_entity(Entity::BlockReference(BlockReference {
                block_name: block_name.into(),
                transform,
            }));
        }

        /// 注册块定义；同名块后注册者覆盖先注册者。
        pub fn add_block(&mut self, definition: BlockDefinition) {
            self.blocks.insert(definition.name.clone(), definition);
        }

        #[inline]
        pub fn entities(&self) -> impl Iterator<Item = &Entity> {
            self.entities.iter()
        }

        #[inline]
        pub fn entity_count(&self) -> usize {
            self.entities.len()
        }

        #[inline]
        pub fn block(&self, name: &str) -> Option<&BlockDefinition> {
            self.blocks.get(name)
        }

        #[inline]
        pub fn blocks(&self) -> impl Iterator<Item = &BlockDefinition> {
            self.blocks.values()
        }
    }

}
