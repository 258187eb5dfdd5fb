//! Services layer - Business logic
//!
//! This module contains the business rules of the blog:
//! - Post visibility and the author/staff authorization checks
//! - Form validation with per-field messages
//! - Authentication, sessions and password hashing
//! - Uploaded image storage

pub mod category;
pub mod comment;
pub mod location;
pub mod media;
pub mod password;
pub mod post;
pub mod user;
pub mod validation;

pub use category::{CategoryService, CategoryServiceError};
pub use comment::{CommentService, CommentServiceError};
pub use location::{LocationService, LocationServiceError};
pub use media::{MediaError, MediaStorage};
pub use password::{hash_password, verify_password};
pub use post::{PostService, PostServiceError};
pub use user::{LoginInput, RegisterInput, UserService, UserServiceError};
pub use validation::FieldErrors;
