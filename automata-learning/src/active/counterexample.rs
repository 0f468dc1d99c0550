use tracing::trace;

use crate::OracleError;

/// Binary search for the breakpoint of a counterexample of length `length`, following Rivest and
/// Schapire. `alpha(i)` is the answer obtained by running the hypothesis on the first `i`
/// symbols, replacing the reached state by its access word and appending the remaining
/// symbols. Returns the position `i` such that `alpha(i) != alpha(i + 1)`, or `None` if
/// `alpha(0) == alpha(length)`, in which case the word is no counterexample at all.
///
/// Only a logarithmic number of values is computed.
pub fn rivest_schapire<X, F>(length: usize, mut alpha: F) -> Result<Option<usize>, OracleError>
where
    X: PartialEq + std::fmt::Debug,
    F: FnMut(usize) -> Result<X, OracleError>,
{
    let first = alpha(0)?;
    let last = alpha(length)?;
    if first == last {
        return Ok(None);
    }

    // invariant: alpha(lo) == first and alpha(hi) != first
    let (mut lo, mut hi) = (0, length);
    while hi - lo > 1 {
        let mid = lo + (hi - lo) / 2;
        let value = alpha(mid)?;
        trace!("alpha({mid}) = {value:?}");
        if value == first {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    Ok(Some(lo))
}

#[cfg(test)]
mod tests {
    use super::rivest_schapire;

    #[test]
    fn finds_breakpoint() {
        let values = [true, true, true, false, false, true];
        let mut calls = 0;
        let breakpoint = rivest_schapire(values.len() - 1, |i| {
            calls += 1;
            Ok(values[i])
        });
        // alpha(0) == alpha(5), not a counterexample
        assert_eq!(breakpoint, Ok(None));
        assert_eq!(calls, 2);

        let values = [true, true, true, false, false, false];
        let breakpoint = rivest_schapire(values.len() - 1, |i| Ok(values[i]));
        assert_eq!(breakpoint, Ok(Some(2)));

        let values = ["", "x", "xy"];
        assert_eq!(rivest_schapire(2, |i| Ok(values[i])), Ok(Some(0)));
    }
}
