//! Candidate
//!
//! A live key under evaluation. The payload is decoded at most once, and
//! only if a field filter or the projection asks for it.

use serde_json::{json, Map, Value};
use tracing::trace;

use crate::decode::{decode_document, DecodedPayload, PayloadDecoder};
use crate::filter::Subject;

use super::builder::LiveEntry;
use super::{KeySummary, Projection};

pub struct Candidate<'a, D: PayloadDecoder + ?Sized> {
    key: &'a [u8],
    entry: &'a LiveEntry,
    decoder: &'a D,
    /// Outer `None`: not attempted yet; inner `None`: undecodable
    decoded: Option<Option<DecodedPayload>>,
    document: Option<Value>,
}

impl<'a, D: PayloadDecoder + ?Sized> Candidate<'a, D> {
    pub fn new(key: &'a [u8], entry: &'a LiveEntry, decoder: &'a D) -> Self {
        Self {
            key,
            entry,
            decoder,
            decoded: None,
            document: None,
        }
    }

    fn ensure_decoded(&mut self) {
        if self.decoded.is_some() {
            return;
        }
        let decoded = match decode_document(self.decoder, &self.entry.kv.value) {
            Ok(payload) => Some(payload),
            Err(e) => {
                trace!(key = %String::from_utf8_lossy(self.key), error = %e, "payload not decodable");
                None
            }
        };
        self.decoded = Some(decoded);
    }

    /// Root document: `Key`, `Version`, `CreateRevision`, `ModRevision`,
    /// `Lease`, `Stats`, and when decodable `Value` and `TypeMeta`
    fn build_document(&mut self) -> Value {
        self.ensure_decoded();
        let kv = &self.entry.kv;
        let stats = &self.entry.stats;

        let mut root = Map::new();
        root.insert("Key".into(), Value::String(kv.key_lossy()));
        root.insert("Version".into(), json!(kv.version));
        root.insert("CreateRevision".into(), json!(kv.create_revision));
        root.insert("ModRevision".into(), json!(kv.mod_revision));
        root.insert("Lease".into(), json!(kv.lease));
        root.insert(
            "Stats".into(),
            json!({
                "ValueSize": stats.value_size,
                "AllVersionsValueSize": stats.all_versions_value_size,
                "VersionCount": stats.version_count,
            }),
        );
        if let Some(Some(payload)) = &self.decoded {
            root.insert("Value".into(), payload.value.clone());
            root.insert(
                "TypeMeta".into(),
                json!({
                    "APIVersion": payload.type_meta.api_version,
                    "Kind": payload.type_meta.kind,
                }),
            );
        }
        Value::Object(root)
    }

    /// Consume the candidate into its projected summary
    pub fn into_summary(mut self, projection: &Projection) -> KeySummary {
        let value = match projection {
            Projection::Everything => {
                self.ensure_decoded();
                self.decoded
                    .as_mut()
                    .and_then(Option::as_mut)
                    .map(|payload| payload.value.take())
                    .filter(|value| !value.is_null())
            }
            Projection::KeysOnly => None,
            Projection::Fields(paths) => {
                let document = self.document();
                let fields: Map<String, Value> = paths
                    .iter()
                    .filter_map(|path| {
                        path.resolve(document)
                            .ok()
                            .map(|value| (path.as_str().to_string(), value.clone()))
                    })
                    .collect();
                Some(Value::Object(fields))
            }
        };

        let type_meta = if projection.wants_payload() {
            self.decoded
                .take()
                .flatten()
                .map(|payload| payload.type_meta)
        } else {
            None
        };

        let kv = &self.entry.kv;
        KeySummary {
            key: self.key.to_vec(),
            version: kv.version,
            mod_revision: kv.mod_revision,
            create_revision: kv.create_revision,
            lease: kv.lease,
            value,
            type_meta,
            stats: self.entry.stats,
        }
    }
}

impl<D: PayloadDecoder + ?Sized> Subject for Candidate<'_, D> {
    fn key(&self) -> &[u8] {
        self.key
    }

    fn document(&mut self) -> &Value {
        let document = match self.document.take() {
            Some(document) => document,
            None => self.build_document(),
        };
        self.document.insert(document)
    }
}
