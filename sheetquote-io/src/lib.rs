use std::f64::consts::TAU;
use std::fs;
use std::path::Path;

use thiserror::Error;
use sheetquote_core::{
    drawing::{
        Arc, BlockDefinition, BlockReference, Circle, Drawing, Entity, Line, Polyline, Spline,
    },
    geometry::{Point2, Transform2, Vector2},
};

#[derive(Debug, Error)]
pub enum IoError {
    #[error("unsupported feature: {0}")]
    UnsupportedFeature(String),
    #[error("failed to read file {path:?}: {source}")]
    ReadError {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid document structure: {0}")]
    InvalidDocument(String),
}

pub trait DrawingLoader {
    fn load(&self, path: &Path) -> Result<Drawing, IoError>;
}

/// ASCII DXF 解码入口，只读取报价所需的 ENTITIES 与 BLOCKS 段。
pub struct DxfFacade;

impl DxfFacade {
    pub fn new() -> Self {
        Self
    }

    /// 从内存字节解码。非 UTF-8 字节按替换字符处理，坐标与组码均为 ASCII。
    pub fn decode(&self, bytes: &[u8]) -> Result<Drawing, IoError> {
        let data = String::from_utf8_lossy(bytes);
        self.decode_str(&data)
    }

    pub fn decode_str(&self, data: &str) -> Result<Drawing, IoError> {
        let parser = DxfParser::new(data);
        parser.parse().map_err(|err| match err {
            DxfError::Unsupported { feature } => IoError::UnsupportedFeature(feature),
            DxfError::Invalid { message } => IoError::InvalidDocument(message),
        })
    }
}

impl Default for DxfFacade {
    fn default() -> Self {
        Self::new()
    }
}

impl DrawingLoader for DxfFacade {
    fn load(&self, path: &Path) -> Result<Drawing, IoError> {
        let data = fs::read(path).map_err(|source| IoError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        self.decode(&data)
    }
}

#[derive(Debug)]
enum DxfError {
    Unsupported { feature: String },
    Invalid { message: String },
}

impl DxfError {
    fn unsupported(feature: impl Into<String>) -> Self {
        Self::Unsupported {
            feature: feature.into(),
        }
    }

    fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }
}

struct DxfParser<'a> {
    reader: DxfReader<'a>,
}

impl<'a> DxfParser<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            reader: DxfReader::new(source),
        }
    }

    fn parse(mut self) -> Result<Drawing, DxfError> {
        let mut drawing = Drawing::new();
        while let Some((code, value)) = self.reader.next_pair()? {
            if code == 999 {
                continue;
            }
            if code != 0 {
                return Err(DxfError::invalid(format!(
                    "意外的组码 {code}（期望 0 表示 SECTION/EOF）"
                )));
            }
            match value.trim() {
                "SECTION" => {
                    let (name_code, name) = self
                        .reader
                        .next_pair()?
                        .ok_or_else(|| DxfError::invalid("SECTION 缺少名称（组码 2）"))?;
                    if name_code != 2 {
                        return Err(DxfError::invalid(format!(
                            "SECTION 名称使用了组码 {name_code}（期望 2）"
                        )));
                    }
                    match name.trim() {
                        "ENTITIES" => self.parse_entities(&mut drawing)?,
                        "BLOCKS" => self.parse_blocks(&mut drawing)?,
                        _ => self.skip_section()?,
                    }
                }
                "EOF" => break,
                unexpected => {
                    return Err(DxfError::invalid(format!(
                        "意外的标记 {unexpected}，期望 SECTION 或 EOF"
                    )));
                }
            }
        }
        Ok(drawing)
    }

    fn skip_section(&mut self) -> Result<(), DxfError> {
        loop {
            match self.reader.next_pair()? {
                Some((0, value)) if value.trim() == "ENDSEC" => break,
                Some(_) => continue,
                None => {
                    return Err(DxfError::invalid("SECTION 未找到 ENDSEC 终止标记"));
                }
            }
        }
        Ok(())
    }

    fn parse_entities(&mut self, drawing: &mut Drawing) -> Result<(), DxfError> {
        loop {
            let (code, value) = match self.reader.next_pair()? {
                Some(pair) => pair,
                None => return Err(DxfError::invalid("ENTITIES 段提前结束")),
            };
            if code != 0 {
                return Err(DxfError::invalid(format!(
                    "ENTITIES 段遇到组码 {code}（期望 0 表示实体起始）"
                )));
            }

            match value.trim() {
                "ENDSEC" => break,
                "SEQEND" => self.skip_entity_body()?,
                kind => {
                    self.reader.begin_entity();
                    let entity = self.parse_entity(kind)?;
                    // 图纸空间实体（图框、视口等）不属于零件几何
                    if !self.reader.in_paper_space() {
                        drawing.add_entity(entity);
                    }
                }
            }
        }
        Ok(())
    }

    fn parse_blocks(&mut self, drawing: &mut Drawing) -> Result<(), DxfError> {
        loop {
            let (code, value) = match self.reader.next_pair()? {
                Some(pair) => pair,
                None => return Err(DxfError::invalid("BLOCKS 段提前结束")),
            };
            if code != 0 {
                return Err(DxfError::invalid(format!(
                    "BLOCKS 段遇到组码 {code}（期望 0 表示块起始）"
                )));
            }

            match value.trim() {
                "ENDSEC" => break,
                "BLOCK" => {
                    if let Some(definition) = self.parse_block_definition()? {
                        drawing.add_block(definition);
                    }
                }
                _ => {
                    // 未预期的条目（例如游离的 ENDBLK），直接跳过
                    self.skip_entity_body()?;
                }
            }
        }
        Ok(())
    }

    fn parse_block_definition(&mut self) -> Result<Option<BlockDefinition>, DxfError> {
        let mut name: Option<String> = None;
        let mut base_x: f64 = 0.0;
        let mut base_y: f64 = 0.0;
        let mut entities: Vec<Entity> = Vec::new();

        loop {
            match self.reader.next_pair()? {
                Some((0, value)) => match value.trim() {
                    "ENDBLK" => {
                        self.skip_entity_body()?;
                        break;
                    }
                    "SEQEND" => self.skip_entity_body()?,
                    kind => entities.push(self.parse_entity(kind)?),
                },
                Some((code, value)) => match code {
                    2 => name = Some(value.trim().to_string()),
                    10 => base_x = parse_f64(&value, "BLOCK 基点 X")?,
                    20 => base_y = parse_f64(&value, "BLOCK 基点 Y")?,
                    _ => {}
                },
                None => {
                    return Err(DxfError::invalid("BLOCK 定义未找到 ENDBLK 终止标记"));
                }
            }
        }

        let name = name.ok_or_else(|| DxfError::invalid("BLOCK 缺少名称（组码 2）"))?;

        // 模型空间/图纸空间布局块不会被 INSERT 引用
        if is_layout_block(&name) {
            return Ok(None);
        }

        let mut definition = BlockDefinition::new(name, entities);
        definition.base_point = Point2::new(base_x, base_y);
        Ok(Some(definition))
    }

    fn parse_entity(&mut self, kind: &str) -> Result<Entity, DxfError> {
        match kind {
            "LINE" => self.parse_line(),
            "CIRCLE" => self.parse_circle(),
            "ARC" => self.parse_arc(),
            "LWPOLYLINE" => self.parse_lwpolyline(),
            "POLYLINE" => self.parse_polyline(),
            "SPLINE" => self.parse_spline(),
            "INSERT" => self.parse_insert(),
            other => {
                self.skip_entity_body()?;
                Ok(Entity::Unsupported {
                    kind: other.to_string(),
                })
            }
        }
    }

    fn parse_line(&mut self) -> Result<Entity, DxfError> {
        let mut start_x = None;
        let mut start_y = None;
        let mut end_x = None;
        let mut end_y = None;
        loop {
            match self.reader.next_pair()? {
                Some((0, value)) => {
                    self.reader.put_back((0, value));
                    break;
                }
                Some((code, value)) => match code {
                    10 => assign_coord(&mut start_x, &value, "LINE 起点 X（组码 10）")?,
                    20 => assign_coord(&mut start_y, &value, "LINE 起点 Y（组码 20）")?,
                    11 => assign_coord(&mut end_x, &value, "LINE 终点 X（组码 11）")?,
                    21 => assign_coord(&mut end_y, &value, "LINE 终点 Y（组码 21）")?,
                    _ => {}
                },
                None => return Err(DxfError::invalid("LINE 未正确结束")),
            }
        }

        let sx = start_x.ok_or_else(|| DxfError::invalid("LINE 缺少起点 X（组码 10）"))?;
        let sy = start_y.ok_or_else(|| DxfError::invalid("LINE 缺少起点 Y（组码 20）"))?;
        let ex = end_x.ok_or_else(|| DxfError::invalid("LINE 缺少终点 X（组码 11）"))?;
        let ey = end_y.ok_or_else(|| DxfError::invalid("LINE 缺少终点 Y（组码 21）"))?;

        Ok(Entity::Line(Line {
            start: Point2::new(sx, sy),
            end: Point2::new(ex, ey),
        }))
    }

    fn parse_circle(&mut self) -> Result<Entity, DxfError> {
        let mut center_x = None;
        let mut center_y = None;
        let mut radius = None;
        loop {
            match self.reader.next_pair()? {
                Some((0, value)) => {
                    self.reader.put_back((0, value));
                    break;
                }
                Some((code, value)) => match code {
                    10 => assign_coord(&mut center_x, &value, "CIRCLE 圆心 X（组码 10）")?,
                    20 => assign_coord(&mut center_y, &value, "CIRCLE 圆心 Y（组码 20）")?,
                    40 => assign_coord(&mut radius, &value, "CIRCLE 半径（组码 40）")?,
                    _ => {}
                },
                None => return Err(DxfError::invalid("CIRCLE 未正确结束")),
            }
        }

        let cx = center_x.ok_or_else(|| DxfError::invalid("CIRCLE 缺少圆心 X（组码 10）"))?;
        let cy = center_y.ok_or_else(|| DxfError::invalid("CIRCLE 缺少圆心 Y（组码 20）"))?;
        let radius = radius.ok_or_else(|| DxfError::invalid("CIRCLE 缺少半径（组码 40）"))?;
        if radius <= 0.0 {
            return Err(DxfError::invalid(format!("CIRCLE 半径必须为正（值：{radius}）")));
        }

        Ok(Entity::Circle(Circle {
            center: Point2::new(cx, cy),
            radius,
        }))
    }

    fn parse_arc(&mut self) -> Result<Entity, DxfError> {
        let mut center_x = None;
        let mut center_y = None;
        let mut radius = None;
        let mut start_angle = None;
        let mut end_angle = None;
        loop {
            match self.reader.next_pair()? {
                Some((0, value)) => {
                    self.reader.put_back((0, value));
                    break;
                }
                Some((code, value)) => match code {
                    10 => assign_coord(&mut center_x, &value, "ARC 圆心 X（组码 10）")?,
                    20 => assign_coord(&mut center_y, &value, "ARC 圆心 Y（组码 20）")?,
                    40 => assign_coord(&mut radius, &value, "ARC 半径（组码 40）")?,
                    50 => assign_coord(&mut start_angle, &value, "ARC 起始角（组码 50）")?,
                    51 => assign_coord(&mut end_angle, &value, "ARC 终止角（组码 51）")?,
                    _ => {}
                },
                None => return Err(DxfError::invalid("ARC 未正确结束")),
            }
        }

        let cx = center_x.ok_or_else(|| DxfError::invalid("ARC 缺少圆心 X（组码 10）"))?;
        let cy = center_y.ok_or_else(|| DxfError::invalid("ARC 缺少圆心 Y（组码 20）"))?;
        let radius = radius.ok_or_else(|| DxfError::invalid("ARC 缺少半径（组码 40）"))?;
        if radius <= 0.0 {
            return Err(DxfError::invalid(format!("ARC 半径必须为正（值：{radius}）")));
        }
        let start_deg =
            start_angle.ok_or_else(|| DxfError::invalid("ARC 缺少起始角（组码 50）"))?;
        let end_deg = end_angle.ok_or_else(|| DxfError::invalid("ARC 缺少终止角（组码 51）"))?;
        let (start_angle, end_angle) = counter_clockwise_interval(
            start_deg.to_radians(),
            end_deg.to_radians(),
        );

        Ok(Entity::Arc(Arc {
            center: Point2::new(cx, cy),
            radius,
            start_angle,
            end_angle,
        }))
    }

    fn parse_lwpolyline(&mut self) -> Result<Entity, DxfError> {
        let mut is_closed = false;
        let mut points: Vec<Point2> = Vec::new();
        let mut pending_x: Option<f64> = None;
        let mut pending_y: Option<f64> = None;
        loop {
            match self.reader.next_pair()? {
                Some((0, value)) => {
                    self.reader.put_back((0, value));
                    break;
                }
                Some((code, value)) => match code {
                    70 => {
                        let flag = parse_i32(&value, "LWPOLYLINE 标志")?;
                        is_closed = flag & 0x01 == 0x01;
                    }
                    10 => {
                        let x = parse_f64(&value, "LWPOLYLINE 顶点 X")?;
                        if let Some(y) = pending_y.take() {
                            points.push(Point2::new(x, y));
                        } else if pending_x.replace(x).is_some() {
                            return Err(DxfError::invalid(
                                "LWPOLYLINE 顶点缺少对应的 Y（组码 20）",
                            ));
                        }
                    }
                    20 => {
                        let y = parse_f64(&value, "LWPOLYLINE 顶点 Y")?;
                        if let Some(x) = pending_x.take() {
                            points.push(Point2::new(x, y));
                        } else if pending_y.replace(y).is_some() {
                            return Err(DxfError::invalid(
                                "LWPOLYLINE 顶点缺少对应的 X（组码 10）",
                            ));
                        }
                    }
                    // bulge（组码 42）暂按直线段处理
                    _ => {}
                },
                None => return Err(DxfError::invalid("LWPOLYLINE 未正确结束")),
            }
        }

        if pending_x.is_some() || pending_y.is_some() {
            return Err(DxfError::invalid(
                "LWPOLYLINE 顶点坐标成对出现（组码 10/20），检测到不完整的顶点",
            ));
        }

        Ok(Entity::Polyline(Polyline { points, is_closed }))
    }

    /// 旧式 POLYLINE：头部之后跟随 VERTEX 序列并以 SEQEND 结束。
    /// 三维网格与多面网格不参与报价，记为不支持的实体。
    fn parse_polyline(&mut self) -> Result<Entity, DxfError> {
        let mut flags: i16 = 0;
        loop {
            match self.reader.next_pair()? {
                Some((0, value)) => {
                    self.reader.put_back((0, value));
                    break;
                }
                Some((70, value)) => flags = parse_i16(&value, "POLYLINE 标志（组码 70）")?,
                Some(_) => {}
                None => return Err(DxfError::invalid("POLYLINE 未正确结束")),
            }
        }

        if flags & (0x10 | 0x40) != 0 {
            self.skip_polyline_sequence()?;
            return Ok(Entity::Unsupported {
                kind: "POLYLINE_MESH".to_string(),
            });
        }

        let mut points: Vec<Point2> = Vec::new();
        loop {
            match self.reader.next_pair()? {
                Some((0, value)) => match value.trim() {
                    "VERTEX" => points.push(self.parse_vertex()?),
                    "SEQEND" => {
                        self.skip_entity_body()?;
                        break;
                    }
                    _ => {
                        // 缺少 SEQEND 时交还给上层
                        self.reader.put_back((0, value));
                        break;
                    }
                },
                Some((code, value)) => {
                    return Err(DxfError::invalid(format!(
                        "POLYLINE 顶点序列出现意外组码 {code} 值 {value}"
                    )));
                }
                None => return Err(DxfError::invalid("POLYLINE 缺少 SEQEND")),
            }
        }

        Ok(Entity::Polyline(Polyline {
            points,
            is_closed: flags & 0x01 != 0,
        }))
    }

    fn parse_vertex(&mut self) -> Result<Point2, DxfError> {
        let mut x = None;
        let mut y = None;
        loop {
            match self.reader.next_pair()? {
                Some((0, value)) => {
                    self.reader.put_back((0, value));
                    break;
                }
                Some((10, value)) => assign_coord(&mut x, &value, "VERTEX X（组码 10）")?,
                Some((20, value)) => assign_coord(&mut y, &value, "VERTEX Y（组码 20）")?,
                Some(_) => {}
                None => return Err(DxfError::invalid("VERTEX 未正确结束")),
            }
        }
        match (x, y) {
            (Some(x), Some(y)) => Ok(Point2::new(x, y)),
            _ => Err(DxfError::invalid("VERTEX 缺少完整的 XY 坐标")),
        }
    }

    fn skip_polyline_sequence(&mut self) -> Result<(), DxfError> {
        loop {
            match self.reader.next_pair()? {
                Some((0, value)) => match value.trim() {
                    "VERTEX" => self.skip_entity_body()?,
                    "SEQEND" => {
                        self.skip_entity_body()?;
                        break;
                    }
                    _ => {
                        self.reader.put_back((0, value));
                        break;
                    }
                },
                Some(_) => continue,
                None => break,
            }
        }
        Ok(())
    }

    fn parse_spline(&mut self) -> Result<Entity, DxfError> {
        let mut control_points: Vec<Point2> = Vec::new();
        let mut fit_points: Vec<Point2> = Vec::new();
        let mut pending_control_x: Option<f64> = None;
        let mut pending_fit_x: Option<f64> = None;

        loop {
            match self.reader.next_pair()? {
                Some((0, value)) => {
                    self.reader.put_back((0, value));
                    break;
                }
                Some((code, value)) => match code {
                    10 => {
                        if pending_control_x
                            .replace(parse_f64(&value, "SPLINE 控制点 X（组码 10）")?)
                            .is_some()
                        {
                            return Err(DxfError::invalid(
                                "SPLINE 控制点 X（组码 10）在未提供 Y 之前重复出现",
                            ));
                        }
                    }
                    20 => {
                        let y = parse_f64(&value, "SPLINE 控制点 Y（组码 20）")?;
                        let x = pending_control_x.take().ok_or_else(|| {
                            DxfError::invalid("SPLINE 控制点 Y（组码 20）缺少对应的 X")
                        })?;
                        control_points.push(Point2::new(x, y));
                    }
                    11 => {
                        if pending_fit_x
                            .replace(parse_f64(&value, "SPLINE 拟合点 X（组码 11）")?)
                            .is_some()
                        {
                            return Err(DxfError::invalid(
                                "SPLINE 拟合点 X（组码 11）在未提供 Y 之前重复出现",
                            ));
                        }
                    }
                    21 => {
                        let y = parse_f64(&value, "SPLINE 拟合点 Y（组码 21）")?;
                        let x = pending_fit_x.take().ok_or_else(|| {
                            DxfError::invalid("SPLINE 拟合点 Y（组码 21）缺少对应的 X")
                        })?;
                        fit_points.push(Point2::new(x, y));
                    }
                    // 节点、权重、切向量等只影响精确曲线，这里不需要
                    _ => {}
                },
                None => return Err(DxfError::invalid("SPLINE 未正确结束")),
            }
        }

        if let Some(x) = pending_control_x {
            return Err(DxfError::invalid(format!(
                "SPLINE 控制点 X={x} 缺少对应的 Y（组码 20）"
            )));
        }
        if let Some(x) = pending_fit_x {
            return Err(DxfError::invalid(format!(
                "SPLINE 拟合点 X={x} 缺少对应的 Y（组码 21）"
            )));
        }

        Ok(Entity::Spline(Spline::from_points(fit_points, control_points)))
    }

    fn parse_insert(&mut self) -> Result<Entity, DxfError> {
        let mut name = None;
        let mut insert_x = None;
        let mut insert_y = None;
        let mut scale_x: Option<f64> = None;
        let mut scale_y: Option<f64> = None;
        let mut rotation_deg: f64 = 0.0;

        loop {
            match self.reader.next_pair()? {
                Some((0, value)) => {
                    self.reader.put_back((0, value));
                    break;
                }
                Some((code, value)) => match code {
                    2 => {
                        if name.is_some() {
                            return Err(DxfError::invalid("INSERT 遇到重复的块名（组码 2）"));
                        }
                        name = Some(value.trim().to_string());
                    }
                    10 => assign_coord(&mut insert_x, &value, "INSERT 插入点 X（组码 10）")?,
                    20 => assign_coord(&mut insert_y, &value, "INSERT 插入点 Y（组码 20）")?,
                    41 => scale_x = Some(parse_f64(&value, "INSERT 缩放 X")?),
                    42 => scale_y = Some(parse_f64(&value, "INSERT 缩放 Y")?),
                    50 => rotation_deg = parse_f64(&value, "INSERT 旋转角")?,
                    70 | 71 => {
                        // 阵列插入（MINSERT）
                        if parse_i32(&value, "INSERT 阵列计数")? > 1 {
                            return Err(DxfError::unsupported("MINSERT 阵列插入"));
                        }
                    }
                    _ => {}
                },
                None => return Err(DxfError::invalid("INSERT 未正确结束")),
            }
        }

        let name = name.ok_or_else(|| DxfError::invalid("INSERT 缺少块名（组码 2）"))?;
        let ix = insert_x.ok_or_else(|| DxfError::invalid("INSERT 缺少插入点 X（组码 10）"))?;
        let iy = insert_y.ok_or_else(|| DxfError::invalid("INSERT 缺少插入点 Y（组码 20）"))?;
        let sx = scale_x.unwrap_or(1.0);
        let sy = scale_y.unwrap_or(sx);
        if (sx - sy).abs() > 1e-9 {
            return Err(DxfError::unsupported(format!(
                "INSERT {name} 使用非等比缩放（{sx} × {sy}）"
            )));
        }

        self.skip_attributes()?;

        Ok(Entity::BlockReference(BlockReference {
            block_name: name,
            transform: Transform2::new(Vector2::new(ix, iy), rotation_deg.to_radians(), sx),
        }))
    }

    /// INSERT 之后可能跟随 ATTRIB 序列；属性文字与切割无关。
    fn skip_attributes(&mut self) -> Result<(), DxfError> {
        loop {
            match self.reader.next_pair()? {
                Some((0, value)) => match value.trim() {
                    "ATTRIB" => self.skip_entity_body()?,
                    "SEQEND" => {
                        self.skip_entity_body()?;
                        break;
                    }
                    _ => {
                        self.reader.put_back((0, value));
                        break;
                    }
                },
                Some((code, value)) => {
                    return Err(DxfError::invalid(format!(
                        "INSERT 属性段出现意外组码 {code} 值 {value}"
                    )));
                }
                None => break,
            }
        }
        Ok(())
    }

    fn skip_entity_body(&mut self) -> Result<(), DxfError> {
        loop {
            match self.reader.next_pair()? {
                Some((0, value)) => {
                    self.reader.put_back((0, value));
                    break;
                }
                Some(_) => continue,
                None => break,
            }
        }
        Ok(())
    }
}

struct DxfReader<'a> {
    lines: std::str::Lines<'a>,
    buffer: Option<(i32, String)>,
    line_number: usize,
    /// 当前实体是否带有组码 67 = 1（图纸空间）。
    paper_space: bool,
}

impl<'a> DxfReader<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            lines: source.lines(),
            buffer: None,
            line_number: 0,
            paper_space: false,
        }
    }

    fn next_pair(&mut self) -> Result<Option<(i32, String)>, DxfError> {
        if let Some(pair) = self.buffer.take() {
            return Ok(Some(pair));
        }

        let code_line = loop {
            match self.lines.next() {
                Some(line) => {
                    self.line_number += 1;
                    // 容忍文件末尾的空行
                    if !line.trim().is_empty() {
                        break line;
                    }
                }
                None => return Ok(None),
            }
        };

        let value_line = match self.lines.next() {
            Some(line) => {
                self.line_number += 1;
                line
            }
            None => {
                return Err(DxfError::invalid(format!(
                    "文件在第 {} 行结束，缺少与组码对应的值行",
                    self.line_number
                )));
            }
        };

        let code = code_line.trim().parse::<i32>().map_err(|_| {
            DxfError::invalid(format!(
                "第 {} 行的组码 \"{}\" 无法解析为整数",
                self.line_number - 1,
                code_line.trim()
            ))
        })?;
        let value = value_line.trim_end_matches('\r').to_string();
        if code == 67 {
            self.paper_space = value.trim() == "1";
        }
        Ok(Some((code, value)))
    }

    /// 在读取实体主体前调用，清除上一个实体的空间标记。
    fn begin_entity(&mut self) {
        self.paper_space = false;
    }

    fn in_paper_space(&self) -> bool {
        self.paper_space
    }

    /// 解析器在任意时刻至多回退一个 pair：每次 put_back 之后下一次调用必然是 next_pair。
    fn put_back(&mut self, pair: (i32, String)) {
        debug_assert!(self.buffer.is_none(), "DXF pair 回退只允许一层");
        self.buffer = Some(pair);
    }
}

fn is_layout_block(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    lower.starts_with("*model_space") || lower.starts_with("*paper_space")
}

/// 把 DXF 圆弧角规范为逆时针区间，保证 `end >= start`；起止重合视为整圆。
fn counter_clockwise_interval(start: f64, end: f64) -> (f64, f64) {
    let start = start.rem_euclid(TAU);
    let mut end = end.rem_euclid(TAU);
    if (end - start).abs() < 1e-12 {
        end = start + TAU;
    } else if end < start {
        end += TAU;
    }
    (start, end)
}

fn assign_coord(slot: &mut Option<f64>, raw: &str, context: &str) -> Result<(), DxfError> {
    if slot.is_some() {
        return Err(DxfError::invalid(format!("{context} 出现重复值")));
    }
    *slot = Some(parse_f64(raw, context)?);
    Ok(())
}

fn parse_f64(raw: &str, context: &str) -> Result<f64, DxfError> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| DxfError::invalid(format!("{context} 解析失败（值：\"{raw}\"）")))
}

fn parse_i32(raw: &str, context: &str) -> Result<i32, DxfError> {
    raw.trim()
        .parse::<i32>()
        .map_err(|_| DxfError::invalid(format!("{context} 解析失败（值：\"{raw}\"）")))
}

fn parse_i16(raw: &str, context: &str) -> Result<i16, DxfError> {
    let value = parse_i32(raw, context)?;
    i16::try_from(value)
        .map_err(|_| DxfError::invalid(format!("{context} 超出 i16 范围（值：{value}）")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, PI};

    #[test]
    fn arc_interval_wraps_counter_clockwise() {
        let (start, end) = counter_clockwise_interval(350_f64.to_radians(), 10_f64.to_radians());
        assert!((end - start - 20_f64.to_radians()).abs() < 1e-9);

        let (start, end) = counter_clockwise_interval(0.0, FRAC_PI_2);
        assert!(start.abs() < 1e-12);
        assert!((end - FRAC_PI_2).abs() < 1e-12);

        let (start, end) = counter_clockwise_interval(PI, PI);
        assert!((end - start - TAU).abs() < 1e-12);
    }

    #[test]
    fn layout_blocks_are_recognised() {
        assert!(is_layout_block("*Model_Space"));
        assert!(is_layout_block("*PAPER_SPACE0"));
        assert!(!is_layout_block("*U12"));
        assert!(!is_layout_block("BOLT"));
    }

    #[test]
    fn reader_reports_missing_value_line() {
        let mut reader = DxfReader::new("0\nSECTION\n2");
        assert!(matches!(reader.next_pair(), Ok(Some((0, _)))));
        assert!(matches!(reader.next_pair(), Err(DxfError::Invalid { .. })));
    }

    #[test]
    fn reader_rejects_non_numeric_group_code() {
        let mut reader = DxfReader::new("abc\nSECTION\n");
        match reader.next_pair() {
            Err(DxfError::Invalid { message }) => assert!(message.contains("abc")),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
