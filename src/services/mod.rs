pub mod attribute_service;
pub use attribute_service::{AttributeError, AttributeService};

pub mod attribute_service_impl;
pub use attribute_service_impl::SeaOrmAttributeService;

pub mod auth_service;
pub use auth_service::{AuthError, AuthService, AuthUser, ProfileUpdate, Registration, UserInfo};

pub mod auth_service_impl;
pub use auth_service_impl::SeaOrmAuthService;

pub mod image;
pub use self::image::{ImageFormat, ImageService};

pub mod recipe_service;
pub use recipe_service::{RecipeError, RecipeInput, RecipeService, WriteMode};

pub mod recipe_service_impl;
pub use recipe_service_impl::SeaOrmRecipeService;
