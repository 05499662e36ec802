use std::fmt;

use crate::error::{BoxError, PoolError, Result};

type Factory<T> = Box<dyn Fn() -> std::result::Result<T, BoxError> + Send + Sync>;
type WarmUp<T> = Box<dyn Fn(&mut T) -> std::result::Result<(), BoxError> + Send + Sync>;

type LocalFactory<T> = Box<dyn Fn() -> std::result::Result<T, BoxError>>;
type LocalWarmUp<T> = Box<dyn Fn(&mut T) -> std::result::Result<(), BoxError>>;

fn build<T>(
    factory: &dyn Fn() -> std::result::Result<T, BoxError>,
    warm_up: &dyn Fn(&mut T) -> std::result::Result<(), BoxError>,
) -> Result<T> {
    let mut obj = factory().map_err(PoolError::ConstructionFailed)?;
    warm_up(&mut obj).map_err(PoolError::WarmUpFailed)?;

    Ok(obj)
}

/// Builds warmed instances: runs the factory, then the warm-up hook once on the result.
///
/// Both closures must be Send + Sync so a SharedWarmUpPool can call them from its replenisher thread. Use
/// LocalMaker for closures that hold thread bound state.
pub struct Maker<T> {
    factory: Factory<T>,
    warm_up: WarmUp<T>,
}

impl<T> Maker<T> {
    /// Create a Maker from a factory and warm-up hook that cannot fail.
    pub fn new<F, W>(factory: F, warm_up: W) -> Maker<T>
    where
        F: Fn() -> T + Send + Sync + 'static,
        W: Fn(&mut T) + Send + Sync + 'static,
    {
        Maker {
            factory: Box::new(move || Ok(factory())),
            warm_up: Box::new(move |obj| {
                warm_up(obj);
                Ok(())
            }),
        }
    }

    /// Create a Maker whose factory or warm-up hook may fail.
    pub fn fallible<F, W, E1, E2>(factory: F, warm_up: W) -> Maker<T>
    where
        F: Fn() -> std::result::Result<T, E1> + Send + Sync + 'static,
        W: Fn(&mut T) -> std::result::Result<(), E2> + Send + Sync + 'static,
        E1: Into<BoxError>,
        E2: Into<BoxError>,
    {
        Maker {
            factory: Box::new(move || factory().map_err(Into::into)),
            warm_up: Box::new(move |obj| warm_up(obj).map_err(Into::into)),
        }
    }

    /// Construct and warm one instance. An instance whose warm-up fails is dropped.
    pub fn make(&self) -> Result<T> {
        build(&*self.factory, &*self.warm_up)
    }
}

impl<T> fmt::Debug for Maker<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Maker").finish_non_exhaustive()
    }
}

/// Maker for WarmUpPool. The closures stay on the thread that owns the pool, so they may capture Rc,
/// RefCell and other non thread safe state.
pub struct LocalMaker<T> {
    factory: LocalFactory<T>,
    warm_up: LocalWarmUp<T>,
}

impl<T> LocalMaker<T> {
    pub fn new<F, W>(factory: F, warm_up: W) -> LocalMaker<T>
    where
        F: Fn() -> T + 'static,
        W: Fn(&mut T) + 'static,
    {
        LocalMaker {
            factory: Box::new(move || Ok(factory())),
            warm_up: Box::new(move |obj| {
                warm_up(obj);
                Ok(())
            }),
        }
    }

    pub fn fallible<F, W, E1, E2>(factory: F, warm_up: W) -> LocalMaker<T>
    where
        F: Fn() -> std::result::Result<T, E1> + 'static,
        W: Fn(&mut T) -> std::result::Result<(), E2> + 'static,
        E1: Into<BoxError>,
        E2: Into<BoxError>,
    {
        LocalMaker {
            factory: Box::new(move || factory().map_err(Into::into)),
            warm_up: Box::new(move |obj| warm_up(obj).map_err(Into::into)),
        }
    }

    pub fn make(&self) -> Result<T> {
        build(&*self.factory, &*self.warm_up)
    }
}

impl<T> From<Maker<T>> for LocalMaker<T> {
    fn from(maker: Maker<T>) -> LocalMaker<T> {
        LocalMaker {
            factory: maker.factory,
            warm_up: maker.warm_up,
        }
    }
}

impl<T> fmt::Debug for LocalMaker<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalMaker").finish_non_exhaustive()
    }
}
