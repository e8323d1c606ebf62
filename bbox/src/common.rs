pub use anyhow::{ensure, Error, Result};
pub use num_traits::{Float, Num, NumCast, ToPrimitive, Zero};
pub use serde::{Deserialize, Serialize};
