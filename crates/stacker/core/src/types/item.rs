//! Item stacks produced as loot.

/// Default maximum amount a single item stack may hold.
pub const DEFAULT_MAX_STACK_SIZE: u32 = 64;

/// A quantity of one material.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ItemStack {
    pub material: String,
    pub amount: u32,
    #[cfg_attr(feature = "serde", serde(default = "default_max_stack_size"))]
    pub max_stack_size: u32,
}

#[cfg(feature = "serde")]
fn default_max_stack_size() -> u32 {
    DEFAULT_MAX_STACK_SIZE
}

impl ItemStack {
    pub fn new(material: impl Into<String>, amount: u32) -> Self {
        Self {
            material: material.into(),
            amount,
            max_stack_size: DEFAULT_MAX_STACK_SIZE,
        }
    }

    pub fn with_max_stack_size(mut self, max_stack_size: u32) -> Self {
        self.max_stack_size = max_stack_size.max(1);
        self
    }

    /// Two stacks are similar when they could be merged into one.
    pub fn is_similar(&self, other: &ItemStack) -> bool {
        self.material == other.material && self.max_stack_size == other.max_stack_size
    }
}

/// Scales item quantities by `multiplier`, merging similar stacks and
/// re-splitting them by their maximum stack size.
///
/// Totals are rounded to the nearest integer and clamp at `u32::MAX`.
/// Materials keep the order in which they first appear in `items`.
pub fn multiply_items(items: &[ItemStack], multiplier: f64) -> Vec<ItemStack> {
    let mut totals: Vec<(ItemStack, u64)> = Vec::new();
    for item in items {
        match totals.iter_mut().find(|(seen, _)| seen.is_similar(item)) {
            Some((_, total)) => *total = total.saturating_add(u64::from(item.amount)),
            None => totals.push((item.clone(), u64::from(item.amount))),
        }
    }

    let mut result = Vec::new();
    for (template, total) in totals {
        let scaled = (total as f64 * multiplier).round();
        let mut remaining = if scaled >= f64::from(u32::MAX) {
            u32::MAX
        } else {
            scaled.max(0.0) as u32
        };

        let max = template.max_stack_size.max(1);
        while remaining > 0 {
            let amount = remaining.min(max);
            result.push(ItemStack {
                amount,
                ..template.clone()
            });
            remaining -= amount;
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multiply_merges_and_resplits() {
        let items = vec![
            ItemStack::new("bone", 2),
            ItemStack::new("arrow", 1),
            ItemStack::new("bone", 1),
        ];

        let scaled = multiply_items(&items, 30.0);

        // 3 bones * 30 = 90 -> 64 + 26, 1 arrow * 30 = 30
        assert_eq!(
            scaled,
            vec![
                ItemStack::new("bone", 64),
                ItemStack::new("bone", 26),
                ItemStack::new("arrow", 30),
            ]
        );
    }

    #[test]
    fn multiply_respects_custom_stack_sizes() {
        let items = vec![ItemStack::new("nether_star", 1).with_max_stack_size(1)];
        let scaled = multiply_items(&items, 3.0);
        assert_eq!(scaled.len(), 3);
        assert!(scaled.iter().all(|item| item.amount == 1));
    }

    #[test]
    fn multiply_clamps_instead_of_wrapping() {
        let items = vec![ItemStack::new("dirt", u32::MAX).with_max_stack_size(u32::MAX)];
        let scaled = multiply_items(&items, 4.0);
        assert_eq!(scaled, vec![ItemStack::new("dirt", u32::MAX).with_max_stack_size(u32::MAX)]);
    }
}
