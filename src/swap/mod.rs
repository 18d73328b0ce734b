//! Swap module - request validation, dispatch, and result envelopes

pub mod dispatcher;
pub mod request;
pub mod result;

pub use dispatcher::{DispatcherOptions, SwapDispatcher};
pub use request::{
    validate, ImagePayload, SwapRequest, SwapSettings, ValidatedRequest, ValidationError,
    ALLOWED_IMAGE_TYPES, MAX_IMAGE_BYTES,
};
pub use result::{DispatchOutcome, ServicePath, SetupInstructions, SwapResult};
