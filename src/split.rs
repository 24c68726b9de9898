//! Index/payload splitting.
//!
//! Stage 3 of the pipeline. A [`Collection`] carries full post bodies, which
//! are too heavy to load just to render a listing. This stage separates it
//! into an [`Index`] (every field except `body`) and a [`PayloadStore`]
//! (just the bodies, keyed by slug).
//!
//! Pure transformation: no validation, no filtering, no reordering. The
//! index's `slugOrder` and the store's keys correspond one-to-one with the
//! collection's entries.

use crate::collection::Collection;
use crate::types::{Index, PayloadStore};

pub fn split_for_delivery(collection: Collection) -> (Index, PayloadStore) {
    let Collection {
        entries,
        slug_order,
        generated_at,
    } = collection;

    let mut metas = Vec::with_capacity(entries.len());
    let mut payloads = PayloadStore::new();
    for entry in entries {
        let (meta, body) = entry.into_parts();
        payloads.push(meta.slug.clone(), body);
        metas.push(meta);
    }

    let index = Index {
        generated_at,
        slug_order,
        entries: metas,
    };
    (index, payloads)
}
