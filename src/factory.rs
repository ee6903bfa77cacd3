//! Geometry factory: the entry point for constructing geometries.
//!
//! A factory owns its configuration (read-only after construction), a
//! reference to the native context its geometries live in, and four
//! lazily built WKT/WKB codecs. Factories are cheap to clone and share.

use crate::builder::FactoryBuilder;
use crate::codec::{CodecState, WkbGenerator, WkbParser, WktGenerator, WktParser};
use crate::config::FactoryConfig;
use crate::context::{GeometryKind, NativeContext, NativeGeom};
use crate::error::{GeoforgeError, Result};
use crate::geometry::Geometry;
use crate::guard::{self, GeometryLike};
use crate::handle::NativeHandle;
use geo::{
    Coord, Geometry as GeoGeometry, LineString, MultiLineString, MultiPoint, MultiPolygon, Point,
    Polygon,
};
use once_cell::sync::OnceCell;
use smallvec::SmallVec;
use std::sync::Arc;

/// Constructs geometries from coordinates, component geometries, or
/// serialized WKT/WKB.
///
/// # Examples
///
/// ```rust
/// use geoforge::Factory;
///
/// let factory = Factory::new();
/// let point = factory.point(1.5, 2.5);
/// let text = point.as_text()?.unwrap();
/// let parsed = factory.parse_wkt(&text)?;
/// assert!(parsed.equals_exact(&point));
/// # Ok::<(), geoforge::GeoforgeError>(())
/// ```
#[derive(Clone)]
pub struct Factory {
    inner: Arc<FactoryInner>,
}

struct FactoryInner {
    config: FactoryConfig,
    context: Arc<NativeContext>,
    wkt_generator: OnceCell<WktGenerator>,
    wkb_generator: OnceCell<WkbGenerator>,
    wkt_parser: OnceCell<WktParser>,
    wkb_parser: OnceCell<WkbParser>,
}

impl Factory {
    /// A factory with default configuration on the shared context.
    pub fn new() -> Self {
        Self::with_config(FactoryConfig::default())
    }

    /// A factory with the given configuration on the shared context.
    pub fn with_config(config: FactoryConfig) -> Self {
        Self::with_parts(config, NativeContext::shared())
    }

    pub(crate) fn with_parts(config: FactoryConfig, context: Arc<NativeContext>) -> Self {
        Factory {
            inner: Arc::new(FactoryInner {
                config,
                context,
                wkt_generator: OnceCell::new(),
                wkb_generator: OnceCell::new(),
                wkt_parser: OnceCell::new(),
                wkb_parser: OnceCell::new(),
            }),
        }
    }

    /// Builder for advanced configuration (srid, prepare policy, custom
    /// native context).
    pub fn builder() -> FactoryBuilder {
        FactoryBuilder::new()
    }

    /// The factory configuration.
    pub fn config(&self) -> &FactoryConfig {
        &self.inner.config
    }

    /// Spatial reference identifier stamped on created geometries.
    pub fn srid(&self) -> i32 {
        self.inner.config.srid
    }

    /// Whether the native provider behind this factory supports unary
    /// union. When it does not, union-type calls return `None` rather
    /// than fail.
    pub fn supports_unary_union(&self) -> bool {
        self.inner.context.capabilities().unary_union
    }

    /// Whether geometries can be exchanged with `other` without
    /// conversion caveats: equivalent configuration is all that is
    /// required, operands are normalized per operation.
    pub fn compatible_with(&self, other: &Factory) -> bool {
        self.inner.config == other.inner.config
    }

    /// The native context this factory allocates into.
    pub fn context(&self) -> &Arc<NativeContext> {
        &self.inner.context
    }

    /// Snapshot of the codec-state fields for external persistence.
    ///
    /// Codecs are built lazily, so a freshly constructed factory reports
    /// four empty maps.
    pub fn codec_state(&self) -> CodecState {
        CodecState {
            wkt_generator: self
                .inner
                .wkt_generator
                .get()
                .map(|codec| codec.options().clone())
                .unwrap_or_default(),
            wkb_generator: self
                .inner
                .wkb_generator
                .get()
                .map(|codec| codec.options().clone())
                .unwrap_or_default(),
            wkt_parser: self
                .inner
                .wkt_parser
                .get()
                .map(|codec| codec.options().clone())
                .unwrap_or_default(),
            wkb_parser: self
                .inner
                .wkb_parser
                .get()
                .map(|codec| codec.options().clone())
                .unwrap_or_default(),
        }
    }

    /// An uninitialized wrapper: no handle attached, every query answers
    /// `None`/`false`.
    pub fn uninitialized(&self) -> Geometry {
        Geometry::uninitialized(self.clone())
    }

    /// A point geometry.
    pub fn point(&self, x: f64, y: f64) -> Geometry {
        self.wrap(NativeGeom {
            kind: GeometryKind::Point,
            geom: GeoGeometry::Point(Point::new(x, y)),
        })
    }

    /// A line string through the given points. Zero points make an empty
    /// line string; a single point is invalid.
    pub fn line_string(&self, points: &[&Geometry]) -> Result<Geometry> {
        let coords = self.point_coords(points)?;
        if coords.len() == 1 {
            return Err(GeoforgeError::InvalidInput(
                "a line string needs at least two points".to_string(),
            ));
        }
        Ok(self.wrap(NativeGeom {
            kind: GeometryKind::LineString,
            geom: GeoGeometry::LineString(LineString::from(coords)),
        }))
    }

    /// A linear ring through the given points, closed automatically when
    /// the last point differs from the first.
    pub fn linear_ring(&self, points: &[&Geometry]) -> Result<Geometry> {
        let mut coords = self.point_coords(points)?;
        if let (Some(first), Some(last)) = (coords.first().copied(), coords.last().copied()) {
            if first != last {
                coords.push(first);
            }
        }
        if !coords.is_empty() && coords.len() < 4 {
            return Err(GeoforgeError::InvalidInput(
                "a linear ring needs at least three distinct points".to_string(),
            ));
        }
        Ok(self.wrap(NativeGeom {
            kind: GeometryKind::LinearRing,
            geom: GeoGeometry::LineString(LineString::from(coords)),
        }))
    }

    /// A polygon from a shell ring and zero or more hole rings.
    ///
    /// Every component is validated through the foreign-object guard
    /// before attachment. Native handles acquired for components that
    /// were accepted before a failing hole are released on the error
    /// path; partial construction never leaks.
    pub fn polygon(
        &self,
        shell: &dyn GeometryLike,
        holes: &[&dyn GeometryLike],
    ) -> Result<Geometry> {
        let mut components: SmallVec<[NativeHandle; 4]> = SmallVec::new();
        components.push(guard::resolve_ring(self.context(), shell)?);
        for hole in holes {
            components.push(guard::resolve_ring(self.context(), *hole)?);
        }

        let mut rings = Vec::with_capacity(components.len());
        for component in &components {
            match component.geom()?.geom {
                GeoGeometry::LineString(ring) => rings.push(ring),
                _ => {
                    return Err(GeoforgeError::Cast(
                        "linear ring component has no line string form".to_string(),
                    ));
                }
            }
        }
        let shell_ring = rings.remove(0);
        Ok(self.wrap(NativeGeom {
            kind: GeometryKind::Polygon,
            geom: GeoGeometry::Polygon(Polygon::new(shell_ring, rings)),
        }))
        // component handles drop here, releasing their slots
    }

    /// A multi point from point components.
    pub fn multi_point(&self, points: &[&Geometry]) -> Result<Geometry> {
        let members = self.point_coords(points)?;
        Ok(self.wrap(NativeGeom {
            kind: GeometryKind::MultiPoint,
            geom: GeoGeometry::MultiPoint(MultiPoint(
                members.into_iter().map(Point::from).collect(),
            )),
        }))
    }

    /// A multi line string from line string (or linear ring) components.
    pub fn multi_line_string(&self, lines: &[&Geometry]) -> Result<Geometry> {
        let mut members = Vec::with_capacity(lines.len());
        for line in lines {
            let component = self.component_geom(
                *line,
                &[GeometryKind::LineString, GeometryKind::LinearRing],
            )?;
            match component.geom {
                GeoGeometry::LineString(ls) => members.push(ls),
                _ => {
                    return Err(GeoforgeError::Cast(
                        "line component has no line string form".to_string(),
                    ));
                }
            }
        }
        Ok(self.wrap(NativeGeom {
            kind: GeometryKind::MultiLineString,
            geom: GeoGeometry::MultiLineString(MultiLineString(members)),
        }))
    }

    /// A multi polygon from polygon components.
    pub fn multi_polygon(&self, polygons: &[&Geometry]) -> Result<Geometry> {
        let mut members = Vec::with_capacity(polygons.len());
        for polygon in polygons {
            let component = self.component_geom(*polygon, &[GeometryKind::Polygon])?;
            match component.geom {
                GeoGeometry::Polygon(poly) => members.push(poly),
                _ => {
                    return Err(GeoforgeError::Cast(
                        "polygon component has no polygon form".to_string(),
                    ));
                }
            }
        }
        Ok(self.wrap(NativeGeom {
            kind: GeometryKind::MultiPolygon,
            geom: GeoGeometry::MultiPolygon(MultiPolygon(members)),
        }))
    }

    /// A geometry collection from arbitrary initialized components.
    pub fn collection(&self, geometries: &[&Geometry]) -> Result<Geometry> {
        let mut members = Vec::with_capacity(geometries.len());
        for geometry in geometries {
            let Some(nref) = geometry.native_ref() else {
                return Err(GeoforgeError::Cast(
                    "collection component is not backed by a native geometry".to_string(),
                ));
            };
            members.push(nref.context().geom_of(nref.slot())?.geom);
        }
        Ok(self.wrap(NativeGeom {
            kind: GeometryKind::Collection,
            geom: GeoGeometry::GeometryCollection(geo::GeometryCollection(members)),
        }))
    }

    /// Parses well-known text into an initialized geometry.
    pub fn parse_wkt(&self, text: &str) -> Result<Geometry> {
        let geom = self.wkt_parser().parse(text)?;
        Ok(self.wrap(NativeGeom::from_geo(geom)))
    }

    /// Parses well-known binary into an initialized geometry. Accepts
    /// raw bytes or hexadecimal text; both forms produce the same
    /// geometry.
    pub fn parse_wkb(&self, input: impl AsRef<[u8]>) -> Result<Geometry> {
        let geom = self.wkb_parser().parse(input.as_ref())?;
        Ok(self.wrap(NativeGeom::from_geo(geom)))
    }

    pub(crate) fn wrap(&self, geom: NativeGeom) -> Geometry {
        let handle = NativeHandle::alloc(Arc::clone(self.context()), geom);
        Geometry::from_handle(self.clone(), handle)
    }

    pub(crate) fn wkt_generator(&self) -> &WktGenerator {
        self.inner.wkt_generator.get_or_init(WktGenerator::new)
    }

    pub(crate) fn wkb_generator(&self) -> &WkbGenerator {
        self.inner.wkb_generator.get_or_init(WkbGenerator::new)
    }

    fn wkt_parser(&self) -> &WktParser {
        self.inner.wkt_parser.get_or_init(WktParser::new)
    }

    fn wkb_parser(&self) -> &WkbParser {
        self.inner.wkb_parser.get_or_init(WkbParser::new)
    }

    fn component_geom(&self, component: &Geometry, expected: &[GeometryKind]) -> Result<NativeGeom> {
        let Some(nref) = component.native_ref() else {
            return Err(GeoforgeError::Cast(format!(
                "expected an initialized {} component",
                expected[0].name()
            )));
        };
        if !expected.contains(&nref.kind()) {
            return Err(GeoforgeError::Cast(format!(
                "expected a {} component, got {}",
                expected[0].name(),
                nref.kind().name()
            )));
        }
        nref.context().geom_of(nref.slot())
    }

    fn point_coords(&self, points: &[&Geometry]) -> Result<Vec<Coord<f64>>> {
        let mut coords = Vec::with_capacity(points.len());
        for point in points {
            let component = self.component_geom(*point, &[GeometryKind::Point])?;
            match component.geom {
                GeoGeometry::Point(p) => coords.push(p.0),
                _ => {
                    return Err(GeoforgeError::Cast(
                        "point component has no coordinate form".to_string(),
                    ));
                }
            }
        }
        Ok(coords)
    }
}

impl Default for Factory {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Factory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Factory")
            .field("config", &self.inner.config)
            .field("context", &self.inner.context.id())
            .finish()
    }
}
