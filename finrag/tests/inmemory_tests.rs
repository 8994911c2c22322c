//! Property tests for in-memory vector store search ordering.

use std::collections::HashMap;

use finrag::{Chunk, CollectionInfo, InMemoryVectorStore, VectorStore};
use proptest::prelude::*;

/// Generate a non-zero L2-normalized embedding of the given dimension.
fn arb_normalized_embedding(dim: usize) -> impl Strategy<Value = Vec<f32>> {
    proptest::collection::vec(-1.0f32..1.0f32, dim).prop_filter_map(
        "non-zero embedding",
        |mut v| {
            let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
            if norm < 1e-8 {
                return None;
            }
            for val in &mut v {
                *val /= norm;
            }
            Some(v)
        },
    )
}

/// Generate a chunk with a normalized embedding.
fn arb_chunk(dim: usize) -> impl Strategy<Value = Chunk> {
    ("[a-z]{3,8}", "[a-z ]{5,30}", arb_normalized_embedding(dim)).prop_map(
        |(id, text, embedding)| Chunk {
            id,
            text,
            embedding,
            metadata: HashMap::new(),
            document_id: "January".to_string(),
        },
    )
}

/// Searching a written collection returns at most `top_k` results, ordered
/// by descending cosine similarity, and the first result is the stored chunk
/// whose embedding scores highest against the query.
mod prop_inmemory_search_ordering {
    use super::*;

    const DIM: usize = 16;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn results_ordered_descending_and_bounded_by_top_k(
            chunks in proptest::collection::vec(arb_chunk(DIM), 1..20),
            query in arb_normalized_embedding(DIM),
            top_k in 1usize..25,
        ) {
            let rt = tokio::runtime::Runtime::new().unwrap();
            let results = rt.block_on(async {
                let store = InMemoryVectorStore::new();
                let info = CollectionInfo {
                    name: "transactions".to_string(),
                    embedding_model: "test".to_string(),
                    dimensions: DIM,
                    chunk_count: chunks.len(),
                };
                store.write_collection(info, &chunks).await.unwrap();
                store.search("transactions", &query, top_k).await.unwrap()
            });

            let stored_count = chunks.len();

            // Result count is at most top_k and at most the number of stored chunks
            prop_assert!(results.len() <= top_k);
            prop_assert!(results.len() <= stored_count);

            // Results are ordered by descending score
            for window in results.windows(2) {
                prop_assert!(
                    window[0].score >= window[1].score,
                    "results not in descending order: {} < {}",
                    window[0].score,
                    window[1].score,
                );
            }

            // The top result is the best match over all stored chunks
            let best = chunks
                .iter()
                .map(|c| dot(&c.embedding, &query))
                .fold(f32::NEG_INFINITY, f32::max);
            prop_assert!((results[0].score - best).abs() < 1e-4);
        }
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[tokio::test]
async fn rewriting_a_collection_replaces_its_chunks() {
    let store = InMemoryVectorStore::new();
    let chunk = |id: &str, embedding: Vec<f32>| Chunk {
        id: id.to_string(),
        text: id.to_string(),
        embedding,
        metadata: HashMap::new(),
        document_id: "February".to_string(),
    };
    let info = CollectionInfo {
        name: "transactions".to_string(),
        embedding_model: "test".to_string(),
        dimensions: 2,
        chunk_count: 0,
    };

    store.write_collection(info.clone(), &[chunk("old", vec![1.0, 0.0])]).await.unwrap();
    store.write_collection(info, &[chunk("new", vec![0.0, 1.0])]).await.unwrap();

    let results = store.search("transactions", &[1.0, 0.0], 5).await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].chunk.id, "new");
    assert_eq!(store.collection_info("transactions").await.unwrap().chunk_count, 1);
}
