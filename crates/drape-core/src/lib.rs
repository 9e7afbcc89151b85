pub mod config;
pub mod document;
pub mod id;
pub mod model;
pub mod props;
pub mod snap;
pub mod surface;

pub use config::{ElementDefaults, StudioConfig};
pub use document::{DOCUMENT_VERSION, DesignDocuments, DocumentError, ElementRecord, SurfaceDocument};
pub use id::ElementId;
pub use model::*;
pub use props::{ElementProps, FieldEdit, FrameProps, PanelField, PropsError, TextChange};
pub use snap::{GuideAxis, GuideLine, SnapEngine, SnapResult};
pub use surface::{
    ElementSpec, SceneSurface, Selection, SelectionSet, SubscriptionId, SurfaceEvent,
};
