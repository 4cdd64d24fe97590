//! Client-to-worker instruction protocol
//!
//! The client never talks to the worker directly. It drops instruction
//! files into `instructions/` and watches the worker's output directories.
//! - Instruction encoding, unique naming and atomic writes (instruction.rs)
//! - Typed segment/training requests (requests.rs)

pub mod instruction;
pub mod requests;

pub use instruction::{
    list_pending, read_instruction, send_instruction, Instruction, SEGMENT, START_TRAINING,
    STOP_TRAINING,
};
pub use requests::{SegmentRequest, SegmentationFormat, StopTrainingRequest, TrainingRequest};
