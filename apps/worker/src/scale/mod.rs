//! Scale and maqam classification by template rotation

pub mod catalog;
pub mod classifier;

pub use catalog::{ScaleCatalog, ScaleTemplate, PITCH_CLASSES};
pub use classifier::{
    classify, classify_with_rotations, pitch_classes, ScaleMatch, ALL_ROTATIONS, NOTE_NAMES,
};
