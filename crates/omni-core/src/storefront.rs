//! The storefront facade.
//!
//! [`Storefront`] owns one handle to each engine, all sharing the same
//! key-value store. [`ShopperSession`] is what a UI holds for one visitor:
//! OTP gate, login, cart and checkout bound to a session id.

use std::sync::Arc;

use omni_auth::{
    DeliveryInstruction, KvUserDirectory, LocalDelivery, OtpDelivery, OtpVerifier, SessionManager,
    SessionRecord, SessionState, User, UserDirectory,
};
use omni_cache::{Cache, FileStore, KvStore, MemoryStore, SessionId};
use omni_commerce::catalog::seed_products;
use omni_commerce::clock::{system_clock, SharedClock};
use omni_commerce::{
    CartEngine, CatalogStore, CheckoutEngine, Order, Payee, PaymentApp, PaymentIntent, ProductId,
};
use tracing::instrument;

use crate::config::{Backend, StoreConfig};
use crate::StoreError;

/// Builder for [`Storefront`].
pub struct StorefrontBuilder {
    config: StoreConfig,
    store: Option<Arc<dyn KvStore>>,
    clock: SharedClock,
    delivery: Arc<dyn OtpDelivery>,
}

impl StorefrontBuilder {
    /// Use this store instead of the one `store.backend` describes.
    pub fn with_store(mut self, store: Arc<dyn KvStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_clock(mut self, clock: SharedClock) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_delivery(mut self, delivery: Arc<dyn OtpDelivery>) -> Self {
        self.delivery = delivery;
        self
    }

    /// Open storage, wire the engines, and seed the catalog and admin
    /// account when configured to.
    pub async fn build(self) -> Result<Storefront, StoreError> {
        let store: Arc<dyn KvStore> = match self.store {
            Some(store) => store,
            None => match self.config.store.backend {
                Backend::Memory => Arc::new(MemoryStore::new()),
                Backend::File => Arc::new(FileStore::open(&self.config.store.path).await?),
            },
        };
        let cache = Cache::new(store);

        let catalog = CatalogStore::new(cache.clone());
        let directory = Arc::new(KvUserDirectory::new(cache.clone(), self.clock.clone()));
        let otp = OtpVerifier::new(
            cache.clone(),
            self.delivery,
            self.clock.clone(),
            self.config.otp.clone(),
        );
        let sessions = SessionManager::new(
            cache.clone(),
            directory.clone(),
            self.config.session.clone(),
        )
        .with_clock(self.clock.clone());
        let checkout = CheckoutEngine::new(catalog.clone(), cache.clone(), self.clock);

        if self.config.catalog.seed {
            let seeded = catalog.seed_if_empty(seed_products()).await?;
            if seeded > 0 {
                tracing::info!(products = seeded, "catalog seeded");
            }
        }
        if self.config.admin.seed {
            directory
                .seed_admin(
                    &self.config.admin.name,
                    &self.config.admin.email,
                    &self.config.admin.password,
                )
                .await?;
        }

        Ok(Storefront {
            payee: self.config.payment.payee(),
            config: self.config,
            cache,
            catalog,
            directory,
            otp,
            sessions,
            checkout,
        })
    }
}

/// All storefront engines over one store.
#[derive(Clone)]
pub struct Storefront {
    config: StoreConfig,
    cache: Cache,
    catalog: CatalogStore,
    directory: Arc<KvUserDirectory>,
    otp: OtpVerifier,
    sessions: SessionManager,
    checkout: CheckoutEngine,
    payee: Payee,
}

impl std::fmt::Debug for Storefront {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storefront")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Storefront {
    pub fn builder(config: StoreConfig) -> StorefrontBuilder {
        StorefrontBuilder {
            config,
            store: None,
            clock: system_clock(),
            delivery: Arc::new(LocalDelivery),
        }
    }

    /// Build with the configured backend, system clock and local delivery.
    pub async fn open(config: StoreConfig) -> Result<Self, StoreError> {
        Self::builder(config).build().await
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn cache(&self) -> &Cache {
        &self.cache
    }

    pub fn catalog(&self) -> &CatalogStore {
        &self.catalog
    }

    pub fn directory(&self) -> &KvUserDirectory {
        &self.directory
    }

    pub fn otp(&self) -> &OtpVerifier {
        &self.otp
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    pub fn checkout(&self) -> &CheckoutEngine {
        &self.checkout
    }

    pub fn payee(&self) -> &Payee {
        &self.payee
    }

    /// Every registered user, for the admin customers view.
    pub async fn customers(&self) -> Result<Vec<User>, StoreError> {
        Ok(self.directory.list().await?)
    }

    /// Restore (or start) the visitor session `id`.
    pub async fn session(&self, id: SessionId) -> Result<ShopperSession, StoreError> {
        self.sessions.load(&id).await?;
        let cart = CartEngine::load(id.clone(), self.catalog.clone(), self.cache.clone()).await?;

        Ok(ShopperSession {
            id,
            sessions: self.sessions.clone(),
            otp: self.otp.clone(),
            checkout: self.checkout.clone(),
            payee: self.payee.clone(),
            cart,
        })
    }

    /// Start a session under a fresh id.
    pub async fn new_session(&self) -> Result<ShopperSession, StoreError> {
        self.session(SessionId::generate()).await
    }

    pub fn payment_intent(&self, order: &Order) -> PaymentIntent {
        PaymentIntent::for_order(order, &self.payee)
    }
}

/// One visitor's view of the store.
pub struct ShopperSession {
    id: SessionId,
    sessions: SessionManager,
    otp: OtpVerifier,
    checkout: CheckoutEngine,
    payee: Payee,
    cart: CartEngine,
}

impl std::fmt::Debug for ShopperSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShopperSession")
            .field("id", &self.id)
            .field("lines", &self.cart.lines().len())
            .finish_non_exhaustive()
    }
}

impl ShopperSession {
    pub fn id(&self) -> &SessionId {
        &self.id
    }

    // OTP gate

    /// Issue a code for `phone`.
    pub async fn send_otp(&self, phone: &str) -> Result<DeliveryInstruction, StoreError> {
        Ok(self.otp.issue(phone).await?)
    }

    pub async fn resend_otp(&self, phone: &str) -> Result<DeliveryInstruction, StoreError> {
        Ok(self.otp.resend(phone).await?)
    }

    /// Verify `code` and mark this session phone-verified.
    #[instrument(skip(self, code), fields(session = %self.id))]
    pub async fn verify_otp(&self, phone: &str, code: &str) -> Result<SessionRecord, StoreError> {
        let proof = self.otp.verify(phone, code).await?;
        Ok(self.sessions.mark_verified(&self.id, proof).await?)
    }

    pub async fn browsing_allowed(&self) -> Result<bool, StoreError> {
        Ok(self.sessions.browsing_allowed(&self.id).await?)
    }

    // Identity

    pub async fn record(&self) -> Result<SessionRecord, StoreError> {
        Ok(self.sessions.load(&self.id).await?)
    }

    pub async fn state(&self) -> Result<SessionState, StoreError> {
        Ok(self.sessions.state(&self.id).await?)
    }

    pub async fn current_user(&self) -> Result<Option<User>, StoreError> {
        Ok(self.sessions.current_user(&self.id).await?)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<User, StoreError> {
        Ok(self.sessions.login(&self.id, email, password).await?)
    }

    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<User, StoreError> {
        Ok(self.sessions.register(&self.id, name, email, password).await?)
    }

    pub async fn logout(&self) -> Result<SessionRecord, StoreError> {
        Ok(self.sessions.logout(&self.id).await?)
    }

    /// Delete the session record and its cart.
    pub async fn end(mut self) -> Result<(), StoreError> {
        self.cart.clear().await?;
        self.sessions.destroy(&self.id).await?;
        Ok(())
    }

    // Cart

    pub fn cart(&self) -> &CartEngine {
        &self.cart
    }

    /// Add one unit. `Ok(false)` means the line is already at the stock
    /// ceiling.
    pub async fn add_to_cart(&mut self, product_id: &ProductId) -> Result<bool, StoreError> {
        self.ensure_browsing().await?;
        Ok(self.cart.add(product_id).await?)
    }

    /// Returns the resulting quantity.
    pub async fn set_quantity(
        &mut self,
        product_id: &ProductId,
        quantity: i64,
    ) -> Result<i64, StoreError> {
        self.ensure_browsing().await?;
        Ok(self.cart.set_quantity(product_id, quantity).await?)
    }

    pub async fn remove_from_cart(&mut self, product_id: &ProductId) -> Result<(), StoreError> {
        Ok(self.cart.remove(product_id).await?)
    }

    pub async fn clear_cart(&mut self) -> Result<(), StoreError> {
        Ok(self.cart.clear().await?)
    }

    // Checkout

    /// Commit the cart as an order for the logged-in user.
    pub async fn checkout(&mut self) -> Result<Order, StoreError> {
        self.ensure_browsing().await?;
        let user = self.current_user().await?;
        let order = self
            .checkout
            .checkout(user.as_ref().map(|u| &u.id), &mut self.cart)
            .await?;
        Ok(order)
    }

    /// Buy one product directly, leaving the cart alone.
    pub async fn buy_now(
        &self,
        product_id: &ProductId,
        quantity: i64,
    ) -> Result<Order, StoreError> {
        self.ensure_browsing().await?;
        let user = self.current_user().await?;
        Ok(self
            .checkout
            .buy_now(user.as_ref().map(|u| &u.id), product_id, quantity)
            .await?)
    }

    /// The logged-in user's orders, newest first.
    pub async fn orders(&self) -> Result<Vec<Order>, StoreError> {
        let user = self
            .current_user()
            .await?
            .ok_or(omni_commerce::CommerceError::NoIdentity)?;
        Ok(self.checkout.orders_for(&user.id).await?)
    }

    /// Deep link paying for `order` in `app`.
    pub fn payment_link(&self, order: &Order, app: PaymentApp) -> Result<String, StoreError> {
        Ok(PaymentIntent::for_order(order, &self.payee).deep_link(app)?)
    }

    async fn ensure_browsing(&self) -> Result<(), StoreError> {
        if self.sessions.config().require_phone_verification && !self.browsing_allowed().await? {
            return Err(omni_auth::AuthError::PhoneNotVerified.into());
        }
        Ok(())
    }
}
