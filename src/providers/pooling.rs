use ndarray::{Array2, ArrayView2, ArrayView3, Axis};

/// Average token embeddings over the positions the attention mask keeps.
///
/// `hidden` is `[batch, seq, dim]`, `mask` is `[batch, seq]`; the result is
/// `[batch, dim]`. Rows whose mask is all zero pool to zero vectors.
pub fn mean_pool(hidden: ArrayView3<'_, f32>, mask: ArrayView2<'_, i64>) -> Array2<f32> {
    let mask = mask.mapv(|m| if m > 0 { 1.0f32 } else { 0.0 });
    let counts = mask
        .sum_axis(Axis(1))
        .mapv(|c| c.max(1.0))
        .insert_axis(Axis(1));
    let weights = mask.insert_axis(Axis(2));

    let summed = (&hidden * &weights).sum_axis(Axis(1));
    summed / &counts
}

/// Scale a vector to unit length; zero vectors are returned unchanged.
pub fn l2_normalize(v: &[f32]) -> Vec<f32> {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        v.iter().map(|x| x / norm).collect()
    } else {
        v.to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array3, array};

    #[test]
    fn test_mean_pool_respects_mask() {
        // batch 0 keeps both positions, batch 1 only the first
        let hidden = Array3::from_shape_vec(
            (2, 2, 3),
            vec![
                1.0, 2.0, 3.0, 3.0, 4.0, 5.0, //
                2.0, 2.0, 2.0, 100.0, 100.0, 100.0,
            ],
        )
        .unwrap();
        let mask = array![[1i64, 1], [1, 0]];

        let pooled = mean_pool(hidden.view(), mask.view());

        assert_eq!(pooled.shape(), &[2, 3]);
        assert_eq!(pooled.row(0).to_vec(), vec![2.0, 3.0, 4.0]);
        assert_eq!(pooled.row(1).to_vec(), vec![2.0, 2.0, 2.0]);
    }

    #[test]
    fn test_mean_pool_all_masked_is_zero() {
        let hidden = Array3::from_elem((1, 2, 2), 7.0f32);
        let mask = array![[0i64, 0]];
        let pooled = mean_pool(hidden.view(), mask.view());
        assert_eq!(pooled.row(0).to_vec(), vec![0.0, 0.0]);
    }

    #[test]
    fn test_l2_normalize() {
        let v = l2_normalize(&[3.0, 4.0]);
        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((v[1] - 0.8).abs() < 1e-6);
        assert_eq!(l2_normalize(&[0.0, 0.0]), vec![0.0, 0.0]);
    }
}
