//! Integration tests for the interpolation group coordinator

pub mod test_utils;

mod annotation_completion;
mod annotation_removal;
