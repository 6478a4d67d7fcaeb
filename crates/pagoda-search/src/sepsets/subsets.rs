//! Fixed-size subsets in lexicographic index order.

/// Iterates the `k`-element subsets of `items`, in lexicographic order of
/// positions. `k = 0` yields one empty subset; `k > items.len()` yields none.
pub struct Subsets<'a, T> {
    items: &'a [T],
    indices: Vec<usize>,
    done: bool,
}

impl<'a, T: Clone> Subsets<'a, T> {
    pub fn new(items: &'a [T], k: usize) -> Self {
        Self {
            items,
            indices: (0..k).collect(),
            done: k > items.len(),
        }
    }
}

impl<T: Clone> Iterator for Subsets<'_, T> {
    type Item = Vec<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let subset = self.indices.iter().map(|&i| self.items[i].clone()).collect();

        // Advance to the next combination.
        let n = self.items.len();
        let k = self.indices.len();
        let mut i = k;
        loop {
            if i == 0 {
                self.done = true;
                break;
            }
            i -= 1;
            if self.indices[i] < n - k + i {
                self.indices[i] += 1;
                for j in i + 1..k {
                    self.indices[j] = self.indices[j - 1] + 1;
                }
                break;
            }
        }
        Some(subset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lexicographic_order() {
        let items = ['a', 'b', 'c', 'd'];
        let pairs: Vec<String> = Subsets::new(&items, 2)
            .map(|s| s.into_iter().collect())
            .collect();
        assert_eq!(pairs, ["ab", "ac", "ad", "bc", "bd", "cd"]);
    }

    #[test]
    fn edge_sizes() {
        let items = [1, 2, 3];
        assert_eq!(Subsets::new(&items, 0).count(), 1);
        assert_eq!(Subsets::new(&items, 3).collect::<Vec<_>>(), vec![vec![1, 2, 3]]);
        assert_eq!(Subsets::new(&items, 4).count(), 0);
        assert_eq!(Subsets::new(&[] as &[i32], 0).count(), 1);
    }
}
