//! Payload encoding adapter.
//!
//! A filter payload reaches the proxy in one of two shapes, selected by the
//! proxy's [`EncodingCapability`]:
//!
//! - `TypedAny`: `Any { type_url: <payload type>, value: <protobuf bytes> }`
//! - `LegacyStruct`: `Any { type_url: xds.type.v3.TypedStruct, value:
//!   TypedStruct { type_url: <payload type>, value: Struct } }`
//!
//! Both shapes carry the same logical fields and [`decode_payload`] accepts
//! either one.

use super::struct_conversion::{json_to_struct, struct_to_json};
use crate::domain::EncodingCapability;
use crate::Result;
use envoy_types::pb::google::protobuf::Any;
use prost::Message;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Type URL of the generic struct carrier.
pub const TYPED_STRUCT_TYPE_URL: &str = "type.googleapis.com/xds.type.v3.TypedStruct";

/// Wire form of `xds.type.v3.TypedStruct`.
#[derive(Clone, PartialEq, Message)]
pub struct TypedStruct {
    /// Type URL of the payload the struct stands in for
    #[prost(string, tag = "1")]
    pub type_url: String,
    #[prost(message, optional, tag = "2")]
    pub value: Option<prost_types::Struct>,
}

/// A filter configuration that can be sent in either encoding.
///
/// The serde representation defines the field names used by the struct
/// encoding; `to_proto`/`from_proto` define the typed encoding.
pub trait FilterPayload: Serialize + DeserializeOwned {
    /// Fully-qualified type URL of the typed payload
    const TYPE_URL: &'static str;

    /// Protobuf message carrying the payload
    type Proto: Message + Default;

    fn to_proto(&self) -> Self::Proto;

    fn from_proto(proto: Self::Proto) -> Self;
}

/// Serialize a payload for a proxy with the given capability.
pub fn encode_payload<P: FilterPayload>(payload: &P, encoding: EncodingCapability) -> Result<Any> {
    match encoding {
        EncodingCapability::TypedAny => {
            Ok(Any { type_url: P::TYPE_URL.to_string(), value: payload.to_proto().encode_to_vec() })
        }
        EncodingCapability::LegacyStruct => {
            let fields = json_to_struct(&serde_json::to_value(payload)?)?;
            let carrier =
                TypedStruct { type_url: P::TYPE_URL.to_string(), value: Some(fields) };
            Ok(Any { type_url: TYPED_STRUCT_TYPE_URL.to_string(), value: carrier.encode_to_vec() })
        }
    }
}

/// Recover a payload from either encoding.
pub fn decode_payload<P: FilterPayload>(any: &Any) -> Result<P> {
    match any.type_url.as_str() {
        url if url == P::TYPE_URL => Ok(P::from_proto(P::Proto::decode(any.value.as_slice())?)),
        TYPED_STRUCT_TYPE_URL => {
            let carrier = TypedStruct::decode(any.value.as_slice())?;
            if carrier.type_url != P::TYPE_URL {
                return Err(crate::Error::encoding(format!(
                    "struct payload is for '{}', expected '{}'",
                    carrier.type_url,
                    P::TYPE_URL
                )));
            }
            let fields = carrier.value.unwrap_or_default();
            Ok(serde_json::from_value(struct_to_json(&fields))?)
        }
        other => Err(crate::Error::encoding(format!(
            "unexpected payload type '{}', expected '{}'",
            other,
            P::TYPE_URL
        ))),
    }
}

/// Report which encoding an `Any` was produced with, if it is one of ours.
pub fn detect_encoding(any: &Any) -> Option<EncodingCapability> {
    if any.type_url == TYPED_STRUCT_TYPE_URL {
        Some(EncodingCapability::LegacyStruct)
    } else if any.type_url.starts_with("type.googleapis.com/") {
        Some(EncodingCapability::TypedAny)
    } else {
        None
    }
}
