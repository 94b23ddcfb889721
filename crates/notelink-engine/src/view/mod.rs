//! Projections of the model: the interactive editing view and the
//! serialized data view.

pub mod data;
pub mod editing;
pub mod element;

pub use data::{DataElement, DataNode, DataProcessor};
pub use editing::{
    EditingDowncastContext, EditingView, Mapper, ViewBlock, ViewInline, ViewPosition,
    WidgetRegistry, WidgetSide,
};
pub use element::{DATA_NOTE_PATH, RenderAttributes, UiElement, WidgetId};
