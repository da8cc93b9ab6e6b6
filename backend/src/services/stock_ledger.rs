//! Stock ledger: per-item, per-warehouse quantity records
//!
//! Every quantity change in the system ends up here. Items are located with
//! an [`ItemResolutionStrategy`] and warehouses with the shared
//! [`WarehouseNameResolver`], so historical spellings never fork a record.

use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Serialize;
use shared::{
    group_item_key, parse_group_item_key, Item, ItemGroup, ItemRef, StockShortfall,
    WarehouseNameResolver, WarehouseStockRecord,
};
use tracing::instrument;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::store::ItemStore;

/// The stock-bearing entity a reference resolved to
#[derive(Debug, Clone)]
pub enum ResolvedItem {
    Standalone(Item),
    Grouped { group: ItemGroup, position: usize },
}

impl ResolvedItem {
    pub fn stocks(&self) -> &[WarehouseStockRecord] {
        match self {
            ResolvedItem::Standalone(item) => &item.warehouse_stocks,
            ResolvedItem::Grouped { group, position } => &group.items[*position].warehouse_stocks,
        }
    }

    fn stocks_mut(&mut self) -> &mut Vec<WarehouseStockRecord> {
        match self {
            ResolvedItem::Standalone(item) => &mut item.warehouse_stocks,
            ResolvedItem::Grouped { group, position } => {
                &mut group.items[*position].warehouse_stocks
            }
        }
    }

    /// Stable identity of the stock-bearing entity
    pub fn key(&self) -> String {
        match self {
            ResolvedItem::Standalone(item) => item.id.to_string(),
            ResolvedItem::Grouped { group, position } => group_item_key(group.id, *position),
        }
    }

    pub fn label(&self) -> String {
        match self {
            ResolvedItem::Standalone(item) => item.name.clone(),
            ResolvedItem::Grouped { group, position } => {
                format!("{} / {}", group.name, group.items[*position].name)
            }
        }
    }
}

/// Outcome of one resolution step
#[derive(Debug)]
pub enum Resolution {
    Found(ResolvedItem),
    TryNext,
}

/// One way of locating the item behind a document line
#[async_trait]
pub trait ResolutionStep: Send + Sync {
    fn name(&self) -> &'static str;

    async fn attempt(&self, items: &dyn ItemStore, item: &ItemRef) -> AppResult<Resolution>;
}

/// Group id plus name/SKU; wins over any standalone match
pub struct GroupById;

#[async_trait]
impl ResolutionStep for GroupById {
    fn name(&self) -> &'static str {
        "group_by_id"
    }

    async fn attempt(&self, items: &dyn ItemStore, item: &ItemRef) -> AppResult<Resolution> {
        let Some(group_id) = item.group_id else {
            return Ok(Resolution::TryNext);
        };
        let Some(group) = items.get_group(group_id).await? else {
            return Ok(Resolution::TryNext);
        };
        Ok(
            match group.position_of(item.name.as_deref(), item.sku.as_deref()) {
                Some(position) => Resolution::Found(ResolvedItem::Grouped { group, position }),
                None => Resolution::TryNext,
            },
        )
    }
}

pub struct StandaloneById;

#[async_trait]
impl ResolutionStep for StandaloneById {
    fn name(&self) -> &'static str {
        "standalone_by_id"
    }

    async fn attempt(&self, items: &dyn ItemStore, item: &ItemRef) -> AppResult<Resolution> {
        let Some(id) = item
            .item_id
            .as_deref()
            .and_then(|id| Uuid::parse_str(id.trim()).ok())
        else {
            return Ok(Resolution::TryNext);
        };
        Ok(match items.get_item(id).await? {
            Some(found) => Resolution::Found(ResolvedItem::Standalone(found)),
            None => Resolution::TryNext,
        })
    }
}

pub struct StandaloneByNameOrSku;

#[async_trait]
impl ResolutionStep for StandaloneByNameOrSku {
    fn name(&self) -> &'static str {
        "standalone_by_name_or_sku"
    }

    async fn attempt(&self, items: &dyn ItemStore, item: &ItemRef) -> AppResult<Resolution> {
        if item.name.is_none() && item.sku.is_none() {
            return Ok(Resolution::TryNext);
        }
        Ok(
            match items.find_item(item.name.as_deref(), item.sku.as_deref()).await? {
                Some(found) => Resolution::Found(ResolvedItem::Standalone(found)),
                None => Resolution::TryNext,
            },
        )
    }
}

/// Last resort: walk every active group by composite id, then name or SKU
pub struct ActiveGroupScan;

#[async_trait]
impl ResolutionStep for ActiveGroupScan {
    fn name(&self) -> &'static str {
        "active_group_scan"
    }

    async fn attempt(&self, items: &dyn ItemStore, item: &ItemRef) -> AppResult<Resolution> {
        let composite = item.item_id.as_deref().and_then(parse_group_item_key);
        if composite.is_none() && item.name.is_none() && item.sku.is_none() {
            return Ok(Resolution::TryNext);
        }

        let groups = items.list_active_groups().await?;

        if let Some((group_id, position)) = composite {
            if let Some(group) = groups
                .iter()
                .find(|g| g.id == group_id && position < g.items.len())
            {
                return Ok(Resolution::Found(ResolvedItem::Grouped {
                    group: group.clone(),
                    position,
                }));
            }
        }

        for group in groups {
            if let Some(position) = group.position_of(item.name.as_deref(), item.sku.as_deref()) {
                return Ok(Resolution::Found(ResolvedItem::Grouped { group, position }));
            }
        }
        Ok(Resolution::TryNext)
    }
}

/// Ordered list of resolution steps; the first `Found` wins
pub struct ItemResolutionStrategy {
    steps: Vec<Box<dyn ResolutionStep>>,
}

impl Default for ItemResolutionStrategy {
    fn default() -> Self {
        Self::new(vec![
            Box::new(GroupById),
            Box::new(StandaloneById),
            Box::new(StandaloneByNameOrSku),
            Box::new(ActiveGroupScan),
        ])
    }
}

impl ItemResolutionStrategy {
    pub fn new(steps: Vec<Box<dyn ResolutionStep>>) -> Self {
        Self { steps }
    }

    pub fn step_names(&self) -> Vec<&'static str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    pub async fn resolve(
        &self,
        items: &dyn ItemStore,
        item: &ItemRef,
    ) -> AppResult<Option<ResolvedItem>> {
        for step in &self.steps {
            if let Resolution::Found(found) = step.attempt(items, item).await? {
                tracing::trace!(step = step.name(), item = %item.describe(), "Item resolved");
                return Ok(Some(found));
            }
        }
        Ok(None)
    }
}

/// Result of a successful add/reduce
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StockApplied {
    /// Warehouse key of the record that changed
    pub applied_warehouse: String,
    pub stock_on_hand: Decimal,
}

/// Stock ledger service
#[derive(Clone)]
pub struct StockLedger {
    items: Arc<dyn ItemStore>,
    resolver: Arc<WarehouseNameResolver>,
    strategy: Arc<ItemResolutionStrategy>,
}

impl StockLedger {
    pub fn new(items: Arc<dyn ItemStore>, resolver: Arc<WarehouseNameResolver>) -> Self {
        Self {
            items,
            resolver,
            strategy: Arc::new(ItemResolutionStrategy::default()),
        }
    }

    pub fn resolver(&self) -> &WarehouseNameResolver {
        &self.resolver
    }

    pub async fn resolve(&self, item: &ItemRef) -> AppResult<Option<ResolvedItem>> {
        self.strategy.resolve(self.items.as_ref(), item).await
    }

    /// Receive stock into a warehouse, creating its record if needed
    #[instrument(skip(self, item), fields(item = %item.describe()))]
    pub async fn add_stock(
        &self,
        item: &ItemRef,
        warehouse: &str,
        quantity: Decimal,
    ) -> AppResult<StockApplied> {
        let mut resolved = self
            .resolve(item)
            .await?
            .ok_or_else(|| AppError::ItemNotFound(item.describe()))?;

        let canonical = self.resolver.normalize(warehouse);
        let index = match self.record_index(resolved.stocks(), &canonical) {
            Some(index) => index,
            None => {
                let stocks = resolved.stocks_mut();
                stocks.push(WarehouseStockRecord::empty(canonical.clone()));
                stocks.len() - 1
            }
        };

        let record = &mut resolved.stocks_mut()[index];
        record.receive(quantity);
        let applied = StockApplied {
            applied_warehouse: record.warehouse.clone(),
            stock_on_hand: record.stock_on_hand,
        };

        self.save(&resolved).await?;
        tracing::debug!(
            warehouse = %applied.applied_warehouse,
            %quantity,
            stock_on_hand = %applied.stock_on_hand,
            "Stock added to {}",
            resolved.label()
        );
        Ok(applied)
    }

    /// Release stock from a warehouse; refuses to go below zero
    #[instrument(skip(self, item), fields(item = %item.describe()))]
    pub async fn reduce_stock(
        &self,
        item: &ItemRef,
        warehouse: &str,
        quantity: Decimal,
    ) -> AppResult<StockApplied> {
        let mut resolved = self
            .resolve(item)
            .await?
            .ok_or_else(|| AppError::ItemNotFound(item.describe()))?;

        let canonical = self.resolver.normalize(warehouse);
        let Some(index) = self.record_index(resolved.stocks(), &canonical) else {
            return Err(AppError::InsufficientStock(StockShortfall::new(
                resolved.label(),
                canonical,
                Decimal::ZERO,
                quantity,
            )));
        };

        let available = resolved.stocks()[index].stock_on_hand;
        if available < quantity {
            return Err(AppError::InsufficientStock(StockShortfall::new(
                resolved.label(),
                resolved.stocks()[index].warehouse.clone(),
                available,
                quantity,
            )));
        }

        let record = &mut resolved.stocks_mut()[index];
        record.release(quantity);
        let applied = StockApplied {
            applied_warehouse: record.warehouse.clone(),
            stock_on_hand: record.stock_on_hand,
        };

        self.save(&resolved).await?;
        tracing::debug!(
            warehouse = %applied.applied_warehouse,
            %quantity,
            stock_on_hand = %applied.stock_on_hand,
            "Stock reduced from {}",
            resolved.label()
        );
        Ok(applied)
    }

    /// Current stock on hand; zero when the item or record does not exist
    pub async fn stock_level(&self, item: &ItemRef, warehouse: &str) -> AppResult<Decimal> {
        let Some(resolved) = self.resolve(item).await? else {
            return Ok(Decimal::ZERO);
        };
        let canonical = self.resolver.normalize(warehouse);
        Ok(self
            .record_index(resolved.stocks(), &canonical)
            .map(|index| resolved.stocks()[index].stock_on_hand)
            .unwrap_or(Decimal::ZERO))
    }

    /// Canonical key match first, then the resolver's fuzzy cascade
    fn record_index(&self, stocks: &[WarehouseStockRecord], canonical: &str) -> Option<usize> {
        stocks
            .iter()
            .position(|r| self.resolver.normalize(&r.warehouse) == canonical)
            .or_else(|| {
                stocks
                    .iter()
                    .position(|r| self.resolver.matches(&r.warehouse, canonical))
            })
    }

    async fn save(&self, resolved: &ResolvedItem) -> AppResult<()> {
        match resolved {
            ResolvedItem::Standalone(item) => {
                self.items.save_item_stocks(item.id, &item.warehouse_stocks).await
            }
            ResolvedItem::Grouped { group, position } => {
                self.items
                    .save_group_item_stocks(
                        group.id,
                        *position,
                        &group.items[*position].warehouse_stocks,
                    )
                    .await
            }
        }
    }
}
