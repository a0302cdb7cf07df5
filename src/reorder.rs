//! Drag-and-drop list reordering.

use std::collections::HashMap;

use crate::collection::Entity;
use crate::error::StoreError;

/// Removes the item at `from` and inserts it at `to`. Every other item keeps
/// its relative order.
pub fn move_item<T>(items: &mut Vec<T>, from: usize, to: usize) -> Result<(), StoreError> {
    let len = items.len();
    for index in [from, to] {
        if index >= len {
            return Err(StoreError::IndexOutOfRange { index, len });
        }
    }
    if from != to {
        let item = items.remove(from);
        items.insert(to, item);
    }
    Ok(())
}

/// Non-mutating form of [`move_item`].
pub fn moved<T: Clone>(items: &[T], from: usize, to: usize) -> Result<Vec<T>, StoreError> {
    let mut next = items.to_vec();
    move_item(&mut next, from, to)?;
    Ok(next)
}

/// Sorts `items` to follow `ids`. Records not listed go last, in their current order.
pub fn arrange_by_ids<T: Entity>(items: &mut [T], ids: &[T::Id]) {
    let positions: HashMap<&T::Id, usize> =
        ids.iter().enumerate().map(|(pos, id)| (id, pos)).collect();
    items.sort_by_key(|item| positions.get(item.id()).copied().unwrap_or(usize::MAX));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Banner;

    #[test]
    fn test_move_keeps_relative_order_of_others() {
        let items = vec!['a', 'b', 'c', 'd', 'e'];
        for from in 0..items.len() {
            for to in 0..items.len() {
                let result = moved(&items, from, to).unwrap();
                assert_eq!(result[to], items[from]);
                let moved_item = items[from];
                let others: Vec<char> =
                    result.iter().copied().filter(|c| *c != moved_item).collect();
                let expected: Vec<char> =
                    items.iter().copied().filter(|c| *c != moved_item).collect();
                assert_eq!(others, expected);
            }
        }
    }

    #[test]
    fn test_out_of_range() {
        let mut items = vec![1, 2, 3];
        assert_eq!(
            move_item(&mut items, 3, 0),
            Err(StoreError::IndexOutOfRange { index: 3, len: 3 })
        );
        assert_eq!(
            move_item(&mut items, 0, 5),
            Err(StoreError::IndexOutOfRange { index: 5, len: 3 })
        );
        assert_eq!(items, vec![1, 2, 3]);
    }

    #[test]
    fn test_arrange_puts_unknown_last() {
        let mut banners = vec![
            Banner::new("x", "X", 0),
            Banner::new("b", "B", 1),
            Banner::new("a", "A", 2),
        ];
        arrange_by_ids(&mut banners, &["a".to_string(), "b".to_string()]);
        let ids: Vec<&str> = banners.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "x"]);
    }
}
