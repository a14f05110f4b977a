#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StorageStats {
    pub bytes_downloaded: u64,
    pub bytes_uploaded: u64,
    pub get_requests: u64,
    pub put_requests: u64,
    pub delete_requests: u64,
}

impl StorageStats {
    pub fn new() -> Self {
        StorageStats::default()
    }

    pub fn add_get(&mut self, size: usize) {
        self.get_requests += 1;
        self.bytes_downloaded += size as u64;
    }

    pub fn add_put(&mut self, size: usize) {
        self.put_requests += 1;
        self.bytes_uploaded += size as u64;
    }

    pub fn add_delete(&mut self) {
        self.delete_requests += 1;
    }
}
