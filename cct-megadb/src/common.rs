pub use anyhow::{bail, ensure, format_err, Context as _, Result};
pub use bbox::{prelude::*, HW, XYWH};
pub use indexmap::IndexMap;
pub use itertools::Itertools as _;
pub use serde::{
    de::{Error as _, Visitor},
    Deserialize, Deserializer, Serialize,
};
pub use serde_json::{Map, Value};
pub use std::{
    collections::{HashMap, HashSet},
    fmt,
    fs::{self, File},
    io::{BufReader, BufWriter, Write as _},
    path::{Path, PathBuf},
    time::Duration,
};
pub use tracing::{debug, info, warn};
