use crate::consts::BARCODE_GEM_GROUP_SEPARATOR;
use crate::errors::{MatrixError, Result};

///
/// Split a barcode into its sequence part and its gem group.
///
/// `"AAACCTGA-2"` gives `("AAACCTGA", Some(2))`. A barcode with no separator, or with a
/// suffix that isn't a number, has no gem group.
///
pub fn split_barcode_seq(barcode: &str) -> (&str, Option<u32>) {
    match barcode.split_once(BARCODE_GEM_GROUP_SEPARATOR) {
        Some((seq, gem_group)) => {
            let gem_group = gem_group
                .split(BARCODE_GEM_GROUP_SEPARATOR)
                .next()
                .and_then(|s| s.parse::<u32>().ok());
            (seq, gem_group)
        }
        None => (barcode, None),
    }
}

///
/// Build a boolean inclusion mask of length `len` from a multiset of positions.
///
/// Every axis selection goes through here. Repeated positions count once, and the order of
/// `indices` is lost: selecting through the mask always yields ascending original order.
///
/// # Arguments:
/// - `indices`: positions to include, in any order, possibly repeated
/// - `len`: length of the axis
///
pub fn mask_from_indices(indices: &[usize], len: usize) -> Result<Vec<bool>> {
    let mut mask = vec![false; len];
    for &i in indices {
        match mask.get_mut(i) {
            Some(slot) => *slot = true,
            None => return Err(MatrixError::Bounds { index: i, len }),
        }
    }
    Ok(mask)
}

/// Positions of the `true` entries of a mask, ascending.
pub fn mask_positions(mask: &[bool]) -> Vec<usize> {
    mask.iter()
        .enumerate()
        .filter_map(|(i, &keep)| keep.then_some(i))
        .collect()
}

/// Old position to new position mapping for a mask.
pub(crate) fn mask_remap(mask: &[bool]) -> Vec<Option<usize>> {
    let mut next = 0;
    mask.iter()
        .map(|&keep| {
            if keep {
                next += 1;
                Some(next - 1)
            } else {
                None
            }
        })
        .collect()
}
