use crate::evaluation::text::word_set;
use std::collections::HashSet;

/// Jaccard index of two word sets; two empty sets are disjoint
pub fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(b).count() as f64 / union as f64
}

/// Pairwise similarity matrix over `texts` and the mean off-diagonal entry.
///
/// Zero or one text yields `[[1.0]]` with an average of 1.0 for a single
/// text and 0.0 for none.
pub fn similarity_matrix<S: AsRef<str>>(texts: &[S]) -> (Vec<Vec<f64>>, f64) {
    if texts.len() <= 1 {
        let average = if texts.is_empty() { 0.0 } else { 1.0 };
        return (vec![vec![1.0]], average);
    }

    let sets: Vec<HashSet<String>> = texts.iter().map(|t| word_set(t.as_ref())).collect();
    let n = sets.len();
    let mut matrix = vec![vec![0.0; n]; n];

    for i in 0..n {
        matrix[i][i] = 1.0;
        for j in (i + 1)..n {
            let score = jaccard(&sets[i], &sets[j]);
            matrix[i][j] = score;
            matrix[j][i] = score;
        }
    }

    let pairs = n * (n - 1);
    let total: f64 = (0..n)
        .flat_map(|i| (0..n).filter(move |&j| j != i).map(move |j| (i, j)))
        .map(|(i, j)| matrix[i][j])
        .sum();

    (matrix, total / pairs as f64)
}
