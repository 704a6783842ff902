//! Building blocks for one outbound call: headers, payload encoding and response classification.

pub mod classify;
pub mod headers;
pub mod payload;

pub use classify::{ResponseClass, TokenMarkers, classify};
pub use headers::build_headers;
pub use payload::{
    EncodedPayload, FieldMap, MultipartPart, MultipartPayload, PartValue, PayloadValue,
    RequestBody, encode_payload,
};
