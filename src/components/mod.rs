// ABOUTME: UI components for the inspector's terminal interface

pub mod help;
pub mod history;
pub mod layout;
pub mod listing;
pub mod server_details;
pub mod server_list;
pub mod tabs;

pub use help::HelpComponent;
pub use history::HistoryComponent;
pub use layout::LayoutComponent;
pub use listing::ListingComponent;
pub use server_details::ServerDetailsComponent;
pub use server_list::ServerListComponent;
pub use tabs::TabBarComponent;
