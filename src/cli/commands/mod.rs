mod embed;
mod search;
mod status;

pub use embed::EmbedArgs;
pub use search::SearchArgs;

pub use embed::handle_embed;
pub use search::handle_search;
pub use status::handle_status;
