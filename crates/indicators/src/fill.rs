/// Replace each NaN with the nearest preceding defined value.
///
/// A leading run of NaN has nothing to copy from and is left untouched.
pub fn forward_fill(values: &[f64]) -> Vec<f64> {
    let mut last = f64::NAN;
    values
        .iter()
        .map(|v| {
            if !v.is_nan() {
                last = *v;
            }
            last
        })
        .collect()
}
