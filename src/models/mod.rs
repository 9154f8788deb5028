pub mod enums;
pub mod blood_pressure;
pub mod caregiver;
pub mod delivery;
pub mod medication;
pub mod profile;
pub mod settings;
pub mod snapshot;

pub use enums::*;
pub use blood_pressure::*;
pub use caregiver::*;
pub use delivery::*;
pub use medication::*;
pub use profile::*;
pub use settings::*;
pub use snapshot::*;
