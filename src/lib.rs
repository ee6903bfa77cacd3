//! Factory-mediated geometry engine with native handle management,
//! prepared-geometry caching, and WKT/WKB codecs.
//!
//! ```rust
//! use geoforge::Factory;
//!
//! let factory = Factory::new();
//! let p1 = factory.point(0.0, 0.0);
//! let p2 = factory.point(4.0, 0.0);
//! let p3 = factory.point(2.0, 3.0);
//! let ring = factory.linear_ring(&[&p1, &p2, &p3, &p1])?;
//! let triangle = factory.polygon(&ring, &[])?;
//!
//! assert!(triangle.intersects(&factory.point(2.0, 1.0))?);
//! assert!(!triangle.is_prepared());
//! triangle.prepare();
//! assert!(triangle.is_prepared());
//! # Ok::<(), geoforge::GeoforgeError>(())
//! ```

pub mod builder;
pub mod codec;
pub mod config;
pub mod context;
pub mod error;
pub mod factory;
pub mod ffi;
pub mod geometry;
pub mod guard;
pub mod handle;
pub mod prepared;

pub use builder::FactoryBuilder;
pub use error::{GeoforgeError, Result};
pub use factory::Factory;
pub use geometry::Geometry;

pub use codec::{CodecOptions, CodecState, encode_hex};

pub use config::{AutoPrepare, FactoryConfig};

pub use context::{Capabilities, GeometryKind, NativeContext, native_version};

pub use guard::{GeometryLike, NativeRef};

pub use handle::NativeHandle;

pub use prepared::PreparedGeometry;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common imports
pub mod prelude {

    pub use crate::{Factory, FactoryBuilder, GeoforgeError, Geometry, Result};

    pub use crate::{AutoPrepare, FactoryConfig};

    pub use crate::{GeometryKind, GeometryLike};

    pub use crate::native_version;
}
