/// Dense index of a region in scene assembly order.
///
/// Region ids are assigned once when the scene is built and stay valid for
/// the lifetime of that scene; they index per-region tables directly.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RegionId(pub u32);

impl RegionId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Dense index of an extruded solid in the scene's flat solid table.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SolidId(pub u32);

impl SolidId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}
