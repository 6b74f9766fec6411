//! Maximal marginal relevance selection
//!
//! Given a query embedding and a candidate pool, greedily pick items that
//! are relevant to the query while penalising similarity to the items
//! already picked. `lambda_mult = 1.0` degenerates to plain top-k,
//! `lambda_mult = 0.0` maximises diversity.

/// Cosine similarity between two vectors, 0.0 for zero vectors or mismatched lengths
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

/// Indices of the `fetch_k` candidates most similar to the query, best first
pub fn top_candidates<'a, I>(query: &[f32], embeddings: I, fetch_k: usize) -> Vec<(usize, f32)>
where
    I: IntoIterator<Item = &'a [f32]>,
{
    let mut scored: Vec<(usize, f32)> = embeddings
        .into_iter()
        .enumerate()
        .map(|(idx, emb)| (idx, cosine_similarity(query, emb)))
        .collect();
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(fetch_k);
    scored
}

/// Select up to `k` positions from `candidates` by maximal marginal relevance.
///
/// Returns positions into `candidates` in selection order. Never returns more
/// than `candidates.len()` items.
pub fn select(query: &[f32], candidates: &[&[f32]], k: usize, lambda_mult: f32) -> Vec<usize> {
    let k = k.min(candidates.len());
    if k == 0 {
        return Vec::new();
    }

    let relevance: Vec<f32> = candidates
        .iter()
        .map(|emb| cosine_similarity(query, emb))
        .collect();

    let mut selected: Vec<usize> = Vec::with_capacity(k);
    // Highest similarity to anything already selected, per candidate
    let mut redundancy = vec![f32::NEG_INFINITY; candidates.len()];

    while selected.len() < k {
        let mut best: Option<(usize, f32)> = None;
        for (idx, rel) in relevance.iter().enumerate() {
            if selected.contains(&idx) {
                continue;
            }
            let penalty = if selected.is_empty() { 0.0 } else { redundancy[idx] };
            let score = lambda_mult * rel - (1.0 - lambda_mult) * penalty;
            if best.map_or(true, |(_, s)| score > s) {
                best = Some((idx, score));
            }
        }

        let Some((chosen, _)) = best else { break };
        selected.push(chosen);

        for (idx, emb) in candidates.iter().enumerate() {
            let sim = cosine_similarity(candidates[chosen], emb);
            if sim > redundancy[idx] {
                redundancy[idx] = sim;
            }
        }
    }

    selected
}
