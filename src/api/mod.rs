pub mod benchmark_dto;
pub mod params_dto;
pub mod recipe_dto;
pub mod topology_dto;
