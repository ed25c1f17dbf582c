use crate::internal::common::resources::Consumables;

/// Live capacity of one resource: the slot ceiling, slots in use and the
/// consumables that are currently free.
///
/// Invariant: `used_slots <= max_slots` and `free` never exceeds the declared
/// capacity in any dimension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotCapacity {
    max_slots: u32,
    used_slots: u32,
    free: Consumables,
}

impl SlotCapacity {
    pub fn new(max_slots: u32, total: Consumables) -> Self {
        SlotCapacity {
            max_slots,
            used_slots: 0,
            free: total,
        }
    }

    #[inline]
    pub fn max_slots(&self) -> u32 {
        self.max_slots
    }

    #[inline]
    pub fn used_slots(&self) -> u32 {
        self.used_slots
    }

    #[inline]
    pub fn free(&self) -> &Consumables {
        &self.free
    }

    #[inline]
    pub fn has_free_slot(&self) -> bool {
        self.used_slots < self.max_slots
    }

    pub fn can_run_now(&self, demand: &Consumables) -> bool {
        self.has_free_slot() && self.free.covers(demand)
    }

    /// Takes one slot and `demand`; all or nothing.
    pub fn try_reserve(&mut self, demand: &Consumables) -> bool {
        if !self.has_free_slot() {
            return false;
        }
        if !self.free.try_remove(demand) {
            return false;
        }
        self.used_slots += 1;
        true
    }

    /// Returns one slot and `demand`. Returns `false` when the release does not
    /// match a previous reservation; the state is then clamped to `total`.
    pub fn release(&mut self, demand: &Consumables, total: &Consumables) -> bool {
        let mut valid = true;
        if self.used_slots == 0 {
            valid = false;
        } else {
            self.used_slots -= 1;
        }
        self.free.add(demand);
        if !total.covers(&self.free) {
            valid = false;
            let mut clamped = Consumables::new();
            for (id, amount) in self.free.iter() {
                clamped.set(id, amount.min(total.get(id)));
            }
            self.free = clamped;
        }
        valid
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::internal::common::resources::{CPU_RESOURCE_ID, MEM_RESOURCE_ID};

    #[test]
    fn test_reserve_respects_slot_ceiling() {
        let total = Consumables::from_units(&[(CPU_RESOURCE_ID, 16)]);
        let demand = Consumables::from_units(&[(CPU_RESOURCE_ID, 1)]);
        let mut capacity = SlotCapacity::new(2, total);
        assert!(capacity.try_reserve(&demand));
        assert!(capacity.try_reserve(&demand));
        assert!(!capacity.can_run_now(&demand));
        assert!(!capacity.try_reserve(&demand));
        assert_eq!(capacity.used_slots(), 2);
    }

    #[test]
    fn test_failed_reserve_has_no_side_effect() {
        let total = Consumables::from_units(&[(CPU_RESOURCE_ID, 4), (MEM_RESOURCE_ID, 1)]);
        let mut capacity = SlotCapacity::new(4, total);
        let before = capacity.clone();
        let demand = Consumables::from_units(&[(CPU_RESOURCE_ID, 1), (MEM_RESOURCE_ID, 2)]);
        assert!(!capacity.try_reserve(&demand));
        assert_eq!(capacity, before);
    }

    #[test]
    fn test_unmatched_release_is_clamped() {
        let total = Consumables::from_units(&[(CPU_RESOURCE_ID, 4)]);
        let demand = Consumables::from_units(&[(CPU_RESOURCE_ID, 2)]);
        let mut capacity = SlotCapacity::new(2, total.clone());
        assert!(!capacity.release(&demand, &total));
        assert_eq!(capacity.used_slots(), 0);
        assert_eq!(capacity.free(), &total);
    }
}
