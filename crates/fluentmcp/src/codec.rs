//! Message codec for newline-delimited JSON-RPC 2.0.

use serde_json::{Map, Value};

use crate::types::{
    error_codes, JsonRpcError, JsonRpcErrorObject, JsonRpcMessage, JsonRpcNotification,
    JsonRpcRequest, JsonRpcResponse, McpResult, RequestId, JSONRPC_VERSION,
};

/// Why a line could not be decoded into a message.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    #[error("Parse error: {0}")]
    MalformedJson(String),

    #[error("Invalid request: {reason}")]
    InvalidEnvelope {
        id: Option<RequestId>,
        reason: String,
    },

    /// The line was longer than the session allows and was discarded unread.
    #[error("Invalid request: message exceeds {limit} bytes")]
    Oversized { limit: usize },
}

impl DecodeError {
    pub fn code(&self) -> i32 {
        match self {
            DecodeError::MalformedJson(_) => error_codes::PARSE_ERROR,
            DecodeError::InvalidEnvelope { .. } | DecodeError::Oversized { .. } => {
                error_codes::INVALID_REQUEST
            }
        }
    }

    /// Error response for the offending line. Echoes the id when one could
    /// be recovered from the envelope, `null` otherwise.
    pub fn to_json_rpc_error(&self) -> JsonRpcError {
        let id = match self {
            DecodeError::InvalidEnvelope { id: Some(id), .. } => id.clone(),
            _ => RequestId::Null,
        };
        JsonRpcError::new(id, self.code(), self.to_string())
    }
}

/// Decode one line of bytes into a JSON-RPC message.
pub fn decode(line: &[u8]) -> Result<JsonRpcMessage, DecodeError> {
    let value: Value =
        serde_json::from_slice(line).map_err(|e| DecodeError::MalformedJson(e.to_string()))?;

    let mut obj = match value {
        Value::Object(obj) => obj,
        Value::Array(_) => return Err(invalid(None, "batch messages are not supported")),
        _ => return Err(invalid(None, "message must be a JSON object")),
    };

    let id = obj.remove("id").map(parse_id);
    let recovered = match &id {
        Some(Ok(RequestId::Null)) | Some(Err(_)) | None => None,
        Some(Ok(id)) => Some(id.clone()),
    };

    match obj.get("jsonrpc") {
        Some(Value::String(v)) if v == JSONRPC_VERSION => {}
        _ => {
            return Err(invalid(
                recovered,
                format!("expected \"jsonrpc\": \"{JSONRPC_VERSION}\""),
            ))
        }
    }

    let has_result = obj.contains_key("result");
    let has_error = obj.contains_key("error");

    if let Some(method) = obj.remove("method") {
        let Value::String(method) = method else {
            return Err(invalid(recovered, "method must be a string"));
        };
        if has_result || has_error {
            return Err(invalid(
                recovered,
                "message has both a method and a result or error",
            ));
        }
        let params = take_params(&mut obj).map_err(|reason| invalid(recovered.clone(), reason))?;

        return match id {
            None => Ok(JsonRpcMessage::Notification(JsonRpcNotification::new(
                method, params,
            ))),
            Some(Ok(RequestId::Null)) => Err(invalid(None, "request id must not be null")),
            Some(Err(reason)) => Err(invalid(None, format!("request id {reason}"))),
            Some(Ok(id)) => Ok(JsonRpcMessage::Request(JsonRpcRequest::new(
                id, method, params,
            ))),
        };
    }

    match (has_result, has_error) {
        (true, true) => Err(invalid(recovered, "message has both a result and an error")),
        (true, false) => {
            let id = match id {
                Some(Ok(RequestId::Null)) => {
                    return Err(invalid(None, "response id must not be null"))
                }
                Some(Ok(id)) => id,
                Some(Err(reason)) => return Err(invalid(None, format!("response id {reason}"))),
                None => return Err(invalid(None, "response requires an id")),
            };
            let result = obj.remove("result").unwrap_or(Value::Null);
            Ok(JsonRpcMessage::Response(JsonRpcResponse::new(id, result)))
        }
        (false, true) => {
            let id = match id {
                Some(Ok(id)) => id,
                Some(Err(reason)) => {
                    return Err(invalid(None, format!("error response id {reason}")))
                }
                None => return Err(invalid(None, "error response requires an id")),
            };
            let error = obj.remove("error").unwrap_or(Value::Null);
            let error: JsonRpcErrorObject = serde_json::from_value(error)
                .map_err(|e| invalid(recovered, format!("malformed error object: {e}")))?;
            Ok(JsonRpcMessage::Error(JsonRpcError {
                jsonrpc: JSONRPC_VERSION.to_string(),
                id,
                error,
            }))
        }
        (false, false) => Err(invalid(
            recovered,
            "message has no method, result, or error",
        )),
    }
}

/// Encode a message as a single newline-terminated JSON line.
pub fn encode(message: &JsonRpcMessage) -> McpResult<Vec<u8>> {
    let mut bytes = serde_json::to_vec(message)?;
    bytes.push(b'\n');
    Ok(bytes)
}

/// Every JSON integer serde_json can hold exactly is a valid id. The error
/// names what was wrong with the id.
fn parse_id(value: Value) -> Result<RequestId, &'static str> {
    match value {
        Value::String(s) => Ok(RequestId::String(s)),
        Value::Number(n) => {
            if let Some(n) = n.as_i64() {
                Ok(RequestId::Number(n))
            } else if let Some(n) = n.as_u64() {
                Ok(RequestId::Unsigned(n))
            } else {
                Err("must be a 64-bit integer, not fractional or out of range")
            }
        }
        Value::Null => Ok(RequestId::Null),
        Value::Bool(_) => Err("must be a string or an integer, not a boolean"),
        Value::Array(_) | Value::Object(_) => {
            Err("must be a string or an integer, not an array or object")
        }
    }
}

fn take_params(obj: &mut Map<String, Value>) -> Result<Option<Value>, &'static str> {
    match obj.remove("params") {
        None | Some(Value::Null) => Ok(None),
        Some(params @ (Value::Object(_) | Value::Array(_))) => Ok(Some(params)),
        Some(_) => Err("params must be an object or an array"),
    }
}

fn invalid(id: Option<RequestId>, reason: impl Into<String>) -> DecodeError {
    DecodeError::InvalidEnvelope {
        id,
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_request_keeps_integer_id() {
        let msg = decode(br#"{"jsonrpc":"2.0","id":7,"method":"tools/list"}"#).unwrap();
        match msg {
            JsonRpcMessage::Request(req) => {
                assert_eq!(req.id, RequestId::Number(7));
                assert_eq!(req.method, "tools/list");
                assert!(req.params.is_none());
            }
            other => panic!("expected request, got {other:?}"),
        }
    }

    #[test]
    fn test_decode_request_keeps_string_id() {
        let msg = decode(br#"{"jsonrpc":"2.0","id":"7","method":"ping","params":{}}"#).unwrap();
        assert_eq!(msg.id(), Some(&RequestId::String("7".to_string())));
    }

    #[test]
    fn test_ids_above_i64_max_round_trip() {
        let line = r#"{"jsonrpc":"2.0","id":18446744073709551615,"method":"ping"}"#;
        let msg = decode(line.as_bytes()).unwrap();
        assert_eq!(msg.id(), Some(&RequestId::Unsigned(u64::MAX)));

        let reply = JsonRpcMessage::Response(JsonRpcResponse::new(
            RequestId::Unsigned(u64::MAX),
            json!({}),
        ));
        assert_eq!(
            String::from_utf8(encode(&reply).unwrap()).unwrap(),
            "{\"jsonrpc\":\"2.0\",\"id\":18446744073709551615,\"result\":{}}\n"
        );

        let encoded = encode(&msg).unwrap();
        assert_eq!(&encoded[..encoded.len() - 1], line.as_bytes());

        let min = r#"{"jsonrpc":"2.0","id":-9223372036854775808,"method":"ping"}"#;
        assert_eq!(
            decode(min.as_bytes()).unwrap().id(),
            Some(&RequestId::Number(i64::MIN))
        );
    }

    #[test]
    fn test_bad_id_reason_names_the_problem() {
        let reason = |line: &[u8]| match decode(line).unwrap_err() {
            DecodeError::InvalidEnvelope { id, reason } => {
                assert_eq!(id, None);
                reason
            }
            other => panic!("expected invalid envelope, got {other:?}"),
        };

        assert!(reason(br#"{"jsonrpc":"2.0","id":1.5,"method":"ping"}"#).contains("fractional"));
        assert!(reason(br#"{"jsonrpc":"2.0","id":true,"method":"ping"}"#).contains("boolean"));
        assert!(reason(br#"{"jsonrpc":"2.0","id":[1],"method":"ping"}"#).contains("array"));
        assert!(reason(br#"{"jsonrpc":"2.0","id":null,"method":"ping"}"#).contains("null"));
        assert!(reason(br#"{"jsonrpc":"2.0","result":{}}"#).contains("requires an id"));
    }

    #[test]
    fn test_decode_notification() {
        let msg = decode(br#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#).unwrap();
        assert!(matches!(msg, JsonRpcMessage::Notification(_)));
    }

    #[test]
    fn test_decode_tolerates_trailing_newline() {
        let msg = decode(b"{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"ping\"}\r\n").unwrap();
        assert!(matches!(msg, JsonRpcMessage::Request(_)));
    }

    #[test]
    fn test_decode_error_with_null_id() {
        let msg = decode(
            br#"{"jsonrpc":"2.0","id":null,"error":{"code":-32700,"message":"Parse error"}}"#,
        )
        .unwrap();
        match msg {
            JsonRpcMessage::Error(e) => {
                assert_eq!(e.id, RequestId::Null);
                assert_eq!(e.error.code, -32700);
            }
            other => panic!("expected error, got {other:?}"),
        }
    }

    #[test]
    fn test_malformed_json() {
        let err = decode(br#"{"broken":"#).unwrap_err();
        assert!(matches!(err, DecodeError::MalformedJson(_)));
        assert_eq!(err.code(), -32700);
        assert_eq!(err.to_json_rpc_error().id, RequestId::Null);

        assert!(matches!(decode(b""), Err(DecodeError::MalformedJson(_))));
        assert!(matches!(
            decode(&[0xff, 0xfe, b'{']),
            Err(DecodeError::MalformedJson(_))
        ));
    }

    #[test]
    fn test_wrong_version_echoes_id() {
        let err = decode(br#"{"jsonrpc":"1.0","id":3,"method":"ping"}"#).unwrap_err();
        assert_eq!(err.code(), -32600);
        assert_eq!(err.to_json_rpc_error().id, RequestId::Number(3));

        let err = decode(br#"{"id":"abc","method":"ping"}"#).unwrap_err();
        assert_eq!(err.to_json_rpc_error().id, RequestId::String("abc".to_string()));
    }

    #[test]
    fn test_ambiguous_shapes_rejected() {
        let cases: &[&[u8]] = &[
            br#"{"jsonrpc":"2.0","id":1,"method":"ping","result":{}}"#,
            br#"{"jsonrpc":"2.0","id":1,"result":{},"error":{"code":1,"message":"x"}}"#,
            br#"{"jsonrpc":"2.0","id":1}"#,
            br#"{"jsonrpc":"2.0","result":{}}"#,
            br#"{"jsonrpc":"2.0","id":1.5,"method":"ping"}"#,
            br#"{"jsonrpc":"2.0","id":true,"method":"ping"}"#,
            br#"{"jsonrpc":"2.0","id":1,"method":42}"#,
            br#"{"jsonrpc":"2.0","id":1,"method":"ping","params":"x"}"#,
            br#"[{"jsonrpc":"2.0","id":1,"method":"ping"}]"#,
            br#""just a string""#,
        ];
        for case in cases {
            let err = decode(case).unwrap_err();
            assert!(
                matches!(err, DecodeError::InvalidEnvelope { .. }),
                "expected invalid envelope for {}",
                String::from_utf8_lossy(case)
            );
        }
    }

    #[test]
    fn test_encode_is_newline_terminated() {
        let msg = JsonRpcMessage::Response(JsonRpcResponse::new(
            RequestId::Number(1),
            json!({ "content": [{ "type": "text", "text": "hi" }], "isError": false }),
        ));
        let bytes = encode(&msg).unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            "{\"jsonrpc\":\"2.0\",\"id\":1,\"result\":{\"content\":[{\"type\":\"text\",\"text\":\"hi\"}],\"isError\":false}}\n"
        );
    }

    #[test]
    fn test_round_trip_preserves_ids_and_fields() {
        let lines: &[&str] = &[
            r#"{"jsonrpc":"2.0","id":1,"method":"tools/call","params":{"name":"echo","arguments":{"text":"hi"}}}"#,
            r#"{"jsonrpc":"2.0","id":"req-1","method":"tools/list"}"#,
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            r#"{"jsonrpc":"2.0","id":9007199254740993,"result":{"b":1,"a":[1,2]}}"#,
            r#"{"jsonrpc":"2.0","id":"x","error":{"code":-32601,"message":"Method not found: foo","data":{"k":"v"}}}"#,
        ];
        for line in lines {
            let decoded = decode(line.as_bytes()).unwrap();
            let encoded = encode(&decoded).unwrap();
            assert_eq!(&encoded[..encoded.len() - 1], line.as_bytes());
            assert_eq!(decode(&encoded).unwrap(), decoded);
        }
    }
}
