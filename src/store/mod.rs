//! 记录存储 - 基础设施层
//!
//! 存储以接口形式注入生命周期控制器，换成持久化后端时控制器无需改动。
//!
//! 互斥粒度是单条记录：不同扫描的更新互不阻塞，同一扫描的更新串行执行。

pub mod memory;

pub use memory::InMemoryRecordStore;

use crate::error::AppResult;
use crate::models::ScanRecord;

/// 记录存储接口
///
/// 所有方法都是同步的，实现不得在内部执行网络调用；
/// 调用方也不会在持有记录锁期间等待任何异步操作。
pub trait RecordStore: Send + Sync {
    /// 获取记录快照
    fn get(&self, scan_id: &str) -> AppResult<Option<ScanRecord>>;

    /// 插入记录，已存在时返回校验错误
    fn insert(&self, record: ScanRecord) -> AppResult<()>;

    /// 在记录锁内原子地修改记录，记录不存在时返回 false
    fn update(&self, scan_id: &str, f: &mut dyn FnMut(&mut ScanRecord)) -> AppResult<bool>;

    /// 删除记录，返回删除前的记录
    fn delete(&self, scan_id: &str) -> AppResult<Option<ScanRecord>>;

    /// 所有记录快照，按创建时间排序
    fn list(&self) -> AppResult<Vec<ScanRecord>>;
}

/// 带返回值的原子修改
pub trait RecordStoreExt: RecordStore {
    /// 记录不存在时返回 `None`，否则返回闭包结果
    fn modify<R>(&self, scan_id: &str, f: impl FnOnce(&mut ScanRecord) -> R) -> AppResult<Option<R>> {
        let mut f = Some(f);
        let mut out = None;
        self.update(scan_id, &mut |record| {
            if let Some(f) = f.take() {
                out = Some(f(record));
            }
        })?;
        Ok(out)
    }
}

impl<T: RecordStore + ?Sized> RecordStoreExt for T {}
