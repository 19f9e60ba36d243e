//! Shared utility functions and traits

/// Extension trait for tracking minimum and maximum values in Option<T>.
///
/// Works with any `PartialOrd` value, so `f64` timings can be tracked
/// directly. Unordered values (NaN) are ignored and never stored.
///
/// # Example
///
/// ```
/// use keystroke_stream::utils::MinMaxExt;
///
/// let mut min: Option<f64> = None;
/// let mut max: Option<f64> = None;
///
/// for hold in [80.0, 45.5, 120.25] {
///     min.update_min(hold);
///     max.update_max(hold);
/// }
/// assert_eq!(min, Some(45.5));
/// assert_eq!(max, Some(120.25));
/// ```
pub trait MinMaxExt<T: PartialOrd + Copy> {
    /// Store `value` if it is smaller than the current minimum or none exists
    fn update_min(&mut self, value: T);

    /// Store `value` if it is larger than the current maximum or none exists
    fn update_max(&mut self, value: T);
}

impl<T: PartialOrd + Copy> MinMaxExt<T> for Option<T> {
    fn update_min(&mut self, value: T) {
        if value.partial_cmp(&value).is_none() {
            return;
        }
        if self.map_or(true, |current| value < current) {
            *self = Some(value);
        }
    }

    fn update_max(&mut self, value: T) {
        if value.partial_cmp(&value).is_none() {
            return;
        }
        if self.map_or(true, |current| value > current) {
            *self = Some(value);
        }
    }
}
