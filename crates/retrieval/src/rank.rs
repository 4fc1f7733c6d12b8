use ndarray::ArrayView1;

/// Candidate indices ordered from closest to farthest, with their distances.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ranking {
    pub indices: Vec<usize>,
    pub distances: Vec<f64>,
}

impl Ranking {
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// `(candidate index, distance)` pairs in rank order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.indices
            .iter()
            .copied()
            .zip(self.distances.iter().copied())
    }
}

/// Sort one distance row ascending.
///
/// The sort is stable, so equal distances keep their original index order.
/// Every candidate appears exactly once in the output.
pub fn rank(distance_row: ArrayView1<'_, f64>) -> Ranking {
    let mut indices: Vec<usize> = (0..distance_row.len()).collect();
    indices.sort_by(|&a, &b| distance_row[a].total_cmp(&distance_row[b]));
    let distances = indices.iter().map(|&i| distance_row[i]).collect();
    Ranking { indices, distances }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array1, array};
    use proptest::prelude::*;

    #[test]
    fn orders_ascending() {
        let row = array![0.7, 0.0, 1.0, 0.2];
        let ranking = rank(row.view());
        assert_eq!(ranking.indices, vec![1, 3, 0, 2]);
        assert_eq!(ranking.distances, vec![0.0, 0.2, 0.7, 1.0]);
    }

    #[test]
    fn ties_keep_index_order() {
        let row = array![0.5, 0.1, 0.5, 0.1, 0.5];
        let ranking = rank(row.view());
        assert_eq!(ranking.indices, vec![1, 3, 0, 2, 4]);
    }

    #[test]
    fn empty_row_is_empty_ranking() {
        let row = Array1::<f64>::zeros(0);
        assert!(rank(row.view()).is_empty());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn prop_rank_is_permutation(values in prop::collection::vec(0.0f64..1.0, 0..64)) {
            let row = Array1::from(values.clone());
            let ranking = rank(row.view());
            prop_assert_eq!(ranking.len(), values.len());
            let mut seen = ranking.indices.clone();
            seen.sort_unstable();
            prop_assert_eq!(seen, (0..values.len()).collect::<Vec<_>>());
            for pair in ranking.distances.windows(2) {
                prop_assert!(pair[0] <= pair[1]);
            }
        }

        #[test]
        fn prop_rank_is_stable(values in prop::collection::vec(0u8..4, 1..48)) {
            // Few distinct values so ties are common.
            let row = Array1::from(values.iter().map(|&v| f64::from(v)).collect::<Vec<_>>());
            let ranking = rank(row.view());
            for pair in ranking.iter().collect::<Vec<_>>().windows(2) {
                let ((ia, da), (ib, db)) = (pair[0], pair[1]);
                if da == db {
                    prop_assert!(ia < ib);
                }
            }
        }
    }
}
