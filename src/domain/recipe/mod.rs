pub mod distribution;
pub mod recipe;
pub mod recipe_sampler;
