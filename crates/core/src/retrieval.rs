use crate::corpus::Corpus;
use crate::models::RetrievedChunk;

pub const DEFAULT_TOP_K: usize = 3;

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot = a.iter().zip(b).map(|(x, y)| x * y).sum::<f32>();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Rank every corpus entry by cosine similarity to the query embedding
/// and return the top-k in descending order. Equal scores break toward
/// the earlier entry. An empty corpus returns an empty vector; a k past
/// the corpus size returns everything.
pub fn retrieve_relevant_chunks(
    query_embedding: &[f32],
    corpus: &Corpus,
    top_k: usize,
) -> Vec<RetrievedChunk> {
    let mut scored: Vec<(usize, f32)> = corpus
        .entries()
        .iter()
        .enumerate()
        .map(|(index, entry)| (index, cosine_similarity(query_embedding, &entry.embedding)))
        .collect();

    scored.sort_by(|left, right| right.1.total_cmp(&left.1).then(left.0.cmp(&right.0)));

    scored
        .into_iter()
        .take(top_k)
        .map(|(index, score)| {
            let entry = &corpus.entries()[index];
            RetrievedChunk {
                text: entry.text.clone(),
                source: entry.source.clone(),
                score,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CorpusEntry;

    fn entry(text: &str, source: &str, embedding: Vec<f32>) -> CorpusEntry {
        CorpusEntry {
            text: text.to_string(),
            source: source.to_string(),
            embedding,
        }
    }

    #[test]
    fn identical_vectors_have_similarity_one() {
        let v = vec![0.3, 0.4, 0.5];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn zero_vector_has_similarity_zero() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]), 0.0);
    }

    #[test]
    fn empty_corpus_returns_empty_result() {
        let hits = retrieve_relevant_chunks(&[1.0, 0.0], &Corpus::default(), 3);
        assert!(hits.is_empty());
    }

    #[test]
    fn results_are_ordered_by_descending_similarity() {
        let corpus = Corpus::new(vec![
            entry("far", "a.pdf", vec![0.0, 1.0]),
            entry("near", "b.pdf", vec![1.0, 0.0]),
            entry("middle", "c.pdf", vec![1.0, 1.0]),
        ]);

        let hits = retrieve_relevant_chunks(&[1.0, 0.0], &corpus, 3);
        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].text, "near");
        assert_eq!(hits[1].text, "middle");
        assert_eq!(hits[2].text, "far");
        assert!(hits[0].score >= hits[1].score && hits[1].score >= hits[2].score);
    }

    #[test]
    fn k_past_corpus_size_returns_all_entries() {
        let corpus = Corpus::new(vec![
            entry("only", "a.pdf", vec![1.0, 0.0]),
            entry("other", "b.pdf", vec![0.0, 1.0]),
        ]);

        let hits = retrieve_relevant_chunks(&[1.0, 0.0], &corpus, 10);
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn equal_scores_break_toward_the_earlier_entry() {
        let corpus = Corpus::new(vec![
            entry("first", "a.pdf", vec![1.0, 0.0]),
            entry("second", "b.pdf", vec![1.0, 0.0]),
        ]);

        let hits = retrieve_relevant_chunks(&[1.0, 0.0], &corpus, 1);
        assert_eq!(hits[0].text, "first");
    }
}
