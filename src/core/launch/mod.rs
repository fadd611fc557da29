pub mod arguments;
pub mod classpath;
pub mod natives;

pub use arguments::{build_game_arguments, select_platform_flag, LaunchConfiguration};
pub use classpath::{classpath_string, resolve_classpath, ClasspathReport};
pub use natives::{extract_natives, ExtractionFailure, NativeReport};
