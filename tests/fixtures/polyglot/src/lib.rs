mod util;

use serde::Serialize;

#[derive(Serialize)]
pub struct Config {
    pub name: String,
}
