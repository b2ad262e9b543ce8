use crate::api::benchmark_dto::{FileDto, FileLinkDto};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FileLink {
    Input,
    Output,
}

/// A data file in a task's manifest. Producer and consumer refer to the same artifact by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct File {
    pub name: String,
    pub size: u64,
    pub link: FileLink,
}

impl File {
    pub fn new(name: impl Into<String>, size: u64, link: FileLink) -> Self {
        File { name: name.into(), size, link }
    }

    pub fn input(name: impl Into<String>, size: u64) -> Self {
        Self::new(name, size, FileLink::Input)
    }

    pub fn output(name: impl Into<String>, size: u64) -> Self {
        Self::new(name, size, FileLink::Output)
    }

    pub fn extension(&self) -> &str {
        extension_of(&self.name)
    }
}

/// The part of `name` from its last `.` on, or the whole name when it has no extension.
pub fn extension_of(name: &str) -> &str {
    match name.rfind('.') {
        Some(pos) if pos > 0 => &name[pos..],
        _ => name,
    }
}

impl From<FileLinkDto> for FileLink {
    fn from(dto: FileLinkDto) -> Self {
        match dto {
            FileLinkDto::Input => FileLink::Input,
            FileLinkDto::Output => FileLink::Output,
        }
    }
}

impl From<FileLink> for FileLinkDto {
    fn from(link: FileLink) -> Self {
        match link {
            FileLink::Input => FileLinkDto::Input,
            FileLink::Output => FileLinkDto::Output,
        }
    }
}

impl From<&File> for FileDto {
    fn from(file: &File) -> Self {
        FileDto { name: file.name.clone(), size: file.size, link: file.link.into() }
    }
}

impl From<FileDto> for File {
    fn from(dto: FileDto) -> Self {
        File { name: dto.name, size: dto.size, link: dto.link.into() }
    }
}
